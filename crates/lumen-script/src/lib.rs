//! Lumen Script - RON signal definitions
//!
//! Loads authored scenes from RON files and writes them into a world:
//! - Entities, grouped by scene
//! - Constant signal values
//! - Signal bindings as expression text, scoped to their entity

mod error;
mod loader;
mod schema;

pub use error::{Error, Result};
pub use loader::{ApplyReport, Loader, SignalDefs};
pub use schema::{EntityDef, SceneDef, SceneFile};
