//! Persistent mappings for dealhook.
//!
//! Two record kinds live in a single SQLite database:
//! - [`ChannelMap`]: generated identifier → outbound webhook credential and secret
//! - [`TokenMap`]: external user id → OAuth bearer token
//!
//! The schema is created by embedded refinery migrations on open.

pub mod error;
pub mod store;

pub use error::{Result, StoreError};
pub use store::{ChannelMap, Store, TokenMap};
