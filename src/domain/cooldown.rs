//! Post-trade cooldown gate.

use chrono::NaiveDate;

/// True while fewer than `cooldown_days` whole days have passed since the
/// last trade. The boundary is exclusive: exactly `cooldown_days` later the
/// symbol is tradable again.
pub fn in_cooldown(last_trade: Option<NaiveDate>, today: NaiveDate, cooldown_days: i64) -> bool {
    match last_trade {
        Some(last) => (today - last).num_days() < cooldown_days,
        None => false,
    }
}
