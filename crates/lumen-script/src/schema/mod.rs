//! Schema definitions for RON signal files

pub mod scene;

pub use scene::{EntityDef, SceneDef, SceneFile};
