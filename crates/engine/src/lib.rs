//! Emberfall Engine library.
//!
//! This crate contains all server-side code for the Emberfall session
//! engine.
//!
//! ## Structure
//!
//! - `services/` - Session services (instances, matchmaking, battles, loot)
//! - `infrastructure/` - External dependency implementations (ports + adapters)
//! - `api/` - HTTP and WebSocket entry points
//! - `app` - Application composition

pub mod api;
pub mod app;
pub mod infrastructure;
pub mod services;

pub use app::App;
