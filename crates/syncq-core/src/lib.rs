//! syncq Core - Domain types, configuration and port definitions
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `SyncItem`, `Priority`, `PendingEntry`, `FailedEntry`
//! - **Port definitions** - `IRemotePush`, the operation that propagates a
//!   change to the remote store
//! - **Configuration** - YAML-backed `Config` with validation and a builder
//!
//! # Architecture
//!
//! The domain module contains pure data types with no runtime dependencies.
//! Ports define trait interfaces that the embedding application implements.
//! The dispatch crate (`syncq-dispatch`) drives domain entities through ports.

pub mod config;
pub mod domain;
pub mod ports;
