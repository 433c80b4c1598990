pub mod config;
pub mod datastore;
mod db;
pub mod migration;
pub mod store;

pub mod api {
    pub use herv_core::api::*;
}

pub mod validate {
    pub use herv_core::validate::*;
}

pub use config::{
    DatabaseConfig, HervConfig, IntegrityConfig, LimitsConfig, PoolConfig, ValidationMode,
};
pub use datastore::{default_sqlite_path, load_or_init_config, open_store, prepare_sqlite_file};
pub use herv_core::*;
pub use store::HervStore;
