pub mod config;
pub mod document;
pub mod error;
pub mod layout;
pub mod types;

pub use config::DescmergeConfig;
pub use document::Document;
pub use error::{SyncError, SyncResult};
pub use layout::Layout;
pub use types::*;
