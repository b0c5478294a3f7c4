//! Single-conversation chat with a simulated counterpart and a local,
//! sqlite-backed history.

pub mod config;
pub mod error;
pub mod presentation;
pub mod reply;
pub mod storage;
pub mod store;
pub mod timeline;

pub use config::Settings;
pub use store::TimelineStore;
pub use timeline::{Author, Message, Timeline};
