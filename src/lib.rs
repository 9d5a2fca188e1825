//! Per-device persistence backend and sync client for a kids' discovery
//! companion app.
//!
//! Lorebook is the data backbone of an account-free mobile app: every piece of
//! state (settings, activity stats, saved knowledge cards, chat sessions) is
//! scoped by an opaque device identifier sent as a request header. The server
//! owns the durable copy in a single SQLite file; the client keeps
//! non-authoritative cached copies and reconciles them against the server with
//! a read-through / write-through policy.
//!
//! # Architecture
//!
//! - **Storage**: SQLite, one row per device-scoped entity, JSON payload columns
//! - **API**: axum HTTP server, JSON request/response, `x-device-id` header
//! - **Client**: reqwest-based API client plus an optimistic sync layer with
//!   broadcast change notifications
//! - **Model proxy**: a single inference endpoint forwarded to an external
//!   text/vision model provider
//!
//! # Modules
//!
//! - [`config`] — Configuration loading from TOML files and environment variables
//! - [`db`] — SQLite database initialization, schema, and migrations
//! - [`decode`] — Defensive parse-or-default JSON decoding
//! - [`model`] — Domain types, defaults, and pure domain rules
//! - [`wire`] — Request/response envelope types shared by server and client
//! - [`store`] — Backend persistence: per-entity CRUD over the database
//! - [`server`] — HTTP surface: router, handlers, and the model-provider proxy
//! - [`client`] — Device identity, local cache, remote client, and sync policy

pub mod client;
pub mod config;
pub mod db;
pub mod decode;
pub mod model;
pub mod server;
pub mod store;
pub mod wire;
