pub mod db;
pub mod error;
pub mod store;

pub use error::BanError;
pub use store::{BanStore, MemoryBanStore, SqliteBanStore};
