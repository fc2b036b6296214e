//! # Auditdesk
//!
//! A tracker for audit findings, usable both as a standalone binary and as a
//! library. Findings live in named sheets with administrator-defined column
//! schemas; rows are semi-structured string maps that tolerate schema drift.
//! A row can be delegated to an external party through a time-limited,
//! column-scoped fill-in link, and a deadline engine scans rows for due
//! dates and classifies urgency.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! auditdesk = { version = "0.1", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::path::PathBuf;
//! use auditdesk::server::{AppState, create_router};
//! use auditdesk::store::{SqliteStore, Store};
//!
//! let store = SqliteStore::new(&PathBuf::from("./data/auditdesk.db")).unwrap();
//! store.initialize().unwrap();
//!
//! let state = Arc::new(AppState {
//!     store: Arc::new(store),
//!     public_base_url: None,
//! });
//! let router = create_router(state);
//! // Serve with axum...
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Includes the binary's CLI. Disable with
//!   `default-features = false`.

pub mod config;
pub mod deadline;
pub mod delegation;
pub mod error;
pub mod options;
pub mod server;
pub mod store;
pub mod text;
pub mod types;
