//! Lumen Hub - World ownership and batch signal evaluation
//!
//! The hub owns a [`lumen_core::World`] and reads many signals at once under
//! a single read lock, optionally spread across worker threads.
//!
//! ## Key Components
//!
//! - [`Hub`]: Owns the world and evaluates signal batches
//! - [`EvalConfig`]: Worker count for batch evaluation

mod config;
mod hub;

pub use config::{max_workers, EvalConfig};
pub use hub::Hub;
