//! # murder-tracker
//!
//! Kill logging, murder listings and statistics for a live murder game.
//!
//! Players log kills by entering their victim's kill code; the submission
//! runs through an ordered rule chain before a murder record is stored.
//! Players, locations and game rounds are owned by other modules and only
//! looked up here. Achievement recomputation is requested through an
//! injected notifier.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP)
//!     │
//!     ├── REST Handlers (api/)
//!     │
//!     ├── MurderService (service/)
//!     │     ├── kill submission rules
//!     │     └── stats aggregates
//!     ├── EventBus (domain/)  ──► achievement recomputation
//!     │
//!     └── MurderStore (persistence/)
//!           ├── PostgreSQL
//!           └── in memory
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
