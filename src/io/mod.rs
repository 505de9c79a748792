pub mod blob_store;
pub mod config_io;
pub mod lock;
pub mod persist;
pub mod recovery;
pub mod store_io;
