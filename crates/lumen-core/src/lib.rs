//! Lumen Core - Named signals bound by reactive expressions
//!
//! This crate provides the core types for the lumen signal system:
//! - Scene-scoped entity names (`Name`, `EntityRef`)
//! - Signal storage holding either a constant or a binding (`Signal`, `SignalStore`)
//! - The signal expression language (`Expression`)
//! - Lock capabilities that gate every read and write (`World`, `ReadLock`, `WriteLock`)
//!
//! ## Reading and writing
//!
//! ```
//! use lumen_core::{Name, SignalRef, World};
//!
//! let world = World::new();
//! let mut lock = world.write();
//! lock.spawn(Name::new("player", "hand")).unwrap();
//!
//! let grip = SignalRef::new(Name::new("player", "hand"), "grip");
//! grip.set_value(&mut lock, 0.75);
//!
//! let pressed = SignalRef::new(Name::new("player", "hand"), "pressed");
//! pressed.set_binding(&mut lock, "hand/grip > 0.5", &Name::scope("player"));
//! assert_eq!(pressed.get_signal(&lock), 1.0);
//! ```

mod entity;
mod error;
pub mod expr;
mod identity;
mod signal;
mod world;

pub use entity::{Entity, EntityRef, EntityStore};
pub use error::{Error, ParseError, Result};
pub use expr::{
    BinaryOp, CompareOp, Expression, Func, LogicalOp, Node, NodeIndex, NodeKind, UnaryOp,
    MAX_EXPRESSION_NESTING, MAX_SIGNAL_BINDING_DEPTH, MAX_SIGNAL_EXPRESSION_NODES,
};
pub use identity::{EntityId, Name};
pub use signal::{Signal, SignalRef, SignalStore, DEFAULT_SIGNAL_NAME};
pub use world::{ReadLock, ReadSignals, World, WriteLock};
