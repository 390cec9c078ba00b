//! Browse image/caption pairs kept in two directories and edit the captions.

pub mod app;
pub mod collection;
pub mod config;
pub mod error;
pub mod loader;
pub mod pairing;
pub mod session;
pub mod storage;

pub use collection::{Collection, Pair};
pub use error::{CaptionError, Result};
pub use session::{CaptionSession, CommitFailed};
pub use storage::{CaptionStore, FsCaptionStore};
