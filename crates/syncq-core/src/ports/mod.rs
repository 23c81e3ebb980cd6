//! Port definitions (hexagonal architecture interfaces)
//!
//! Ports are interfaces that the dispatch queue depends on, but whose
//! implementations live in the embedding application.
//!
//! ## Ports Overview
//!
//! - [`IRemotePush`] - Propagates one changed item to the remote store

pub mod remote_push;

pub use remote_push::{FnPush, IRemotePush};
