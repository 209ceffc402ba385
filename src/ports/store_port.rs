//! Persistent symbol store port trait.

use crate::domain::error::RotatraderError;
use crate::domain::symbol_record::Store;

pub trait StorePort {
    /// Load every record. A store that does not exist yet loads as empty.
    fn load(&self) -> Result<Store, RotatraderError>;

    fn save(&self, store: &Store) -> Result<(), RotatraderError>;
}
