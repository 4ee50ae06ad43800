//! Offline-first sync core for a location-tagged food journal.
//!
//! Each *food memory* pins a dish on the map with a photo, a 1–5 rating, and
//! notes. This crate keeps a local cache of those memories in step with the
//! memory server, and keeps the app usable when the server is not reachable:
//!
//! | Operation | Server reachable | Server unreachable |
//! |-----------|------------------|--------------------|
//! | **initialize** | cache only | cache only |
//! | **refresh** | list and cache mirror the server | cached list stays visible |
//! | **add** | server's record is stored | candidate is kept as a local-only entry |
//! | **remove** | removed locally | nothing changes |
//!
//! # Architecture
//!
//! - **Codec**: snake_case JSON with flattened `latitude`/`longitude`, permissive date parsing
//! - **Cache**: one JSON array blob, atomically replaced; file or SQLite backend
//! - **Remote**: HTTP client for the memory server behind the [`remote::RemoteClient`] trait
//! - **Coordinator**: serialized operations with optimistic local fallback
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from TOML files and environment variables
//! - [`memory`]: Record types, the JSON codec, and statistics
//! - [`cache`]: Durable cache backends and health checks
//! - [`db`]: SQLite schema and migrations for the SQLite cache backend
//! - [`remote`]: Remote client trait and HTTP implementation
//! - [`sync`]: The sync coordinator
//! - [`error`]: Error taxonomy

pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod memory;
pub mod remote;
pub mod sync;
