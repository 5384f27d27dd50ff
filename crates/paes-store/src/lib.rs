//! paes-store: Storage backends and configuration.
//!
//! Implements the `paes-core` collaborator traits over process memory and
//! over a directory of JSON files, and builds a configured
//! [`SessionService`](paes_core::session::SessionService) from `paes.toml`.

pub mod config;
pub mod error;
pub mod file;
pub mod memory;

pub use config::{
    create_service, create_stores, load_config, load_config_from, PaesConfig, StoreConfig,
};
pub use error::StoreError;
pub use file::FileStore;
pub use memory::MemoryStore;
