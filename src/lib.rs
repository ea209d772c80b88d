//! geodash: client core for the projects/sites dashboard.
//!
//! ARCHITECTURE
//! ============
//! The backend owns persistence, geometry and auth. This crate owns everything
//! the presentation layer decides on its own:
//!
//! - `net`: authenticated HTTP wrapper and backend DTOs.
//! - `state`: persisted storage, the session store and the idle monitor.
//! - `routes`: route table, navigation sink and route guards.
//! - `features`: per-screen operations (auth, dashboard, projects, sites, users).
//! - `util`: polygon encoding.
//!
//! The `geodash` binary in `main.rs` is one front end over these modules.

pub mod config;
pub mod features;
pub mod net;
pub mod routes;
pub mod state;
pub mod util;
