//! # starlog-core
//!
//! Core library for starlog - a task and focus-session tracker that pays
//! out stars for well-rated sessions and lets you spend them on rewards.
//!
//! This library provides:
//! - Domain types for tasks, sessions, rewards and purchases
//! - The session lifecycle (start / end / cancel)
//! - Session statistics and the derived star balance
//! - The reward catalog with affordability and cooldown checks
//! - A best-effort key-value mirror backed by SQLite
//! - The evaluation template document
//! - Configuration management and logging infrastructure
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use starlog_core::{AppState, Config, Database, SystemClock};
//!
//! let config = Config::load().expect("failed to load config");
//!
//! let db = Database::open(&config.resolved_database_path()).expect("failed to open database");
//! db.migrate().expect("failed to run migrations");
//!
//! let app = AppState::load(Arc::new(db), Arc::new(SystemClock), config.rewards);
//! println!("{} stars available", app.available_stars());
//! ```

// Re-export commonly used items at the crate root
pub use app::AppState;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use db::Database;
pub use error::{Error, Result};
pub use storage::{KeyValueStore, MemoryStore};
pub use templates::TemplateStore;
pub use types::*;

// Public modules
pub mod analytics;
pub mod app;
pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod format;
pub mod logging;
pub mod observable;
pub mod rewards;
pub mod sessions;
pub mod storage;
pub mod tasks;
pub mod templates;
pub mod tutorial;
pub mod types;
