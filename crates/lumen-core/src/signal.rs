//! Signal storage and the `SignalRef` handle
//!
//! A signal is a named `f64` attached to an entity name. It holds either a
//! constant value or a compiled [`Expression`] binding, never both. Reads
//! are total: missing signals, missing entities and broken bindings all read
//! as `0.0`.

use crate::{EntityRef, Expression, Name, ReadSignals, WriteLock};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Signal name used when a reference has no `/signal` part
pub const DEFAULT_SIGNAL_NAME: &str = "value";

static EMPTY_BINDING: Expression = Expression::EMPTY;

/// Stored state of one signal
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    /// A directly set constant
    Value(f64),
    /// An expression evaluated on every read
    Binding(Expression),
}

impl Default for Signal {
    fn default() -> Self {
        Signal::Value(0.0)
    }
}

/// Handle to one signal: an entity reference plus a signal name
///
/// Equality and hashing are by `(entity, name)`, so a `SignalRef` is also the
/// key signals are stored under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SignalRef {
    entity: EntityRef,
    signal: String,
}

impl SignalRef {
    /// Create a handle for `signal` on `entity`
    pub fn new(entity: impl Into<EntityRef>, signal: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            signal: signal.into(),
        }
    }

    /// Parse `entity/signal` or `scene:entity/signal` relative to `scope`
    ///
    /// Without a `/` the whole text names the entity and the signal is
    /// [`DEFAULT_SIGNAL_NAME`].
    pub fn parse(text: &str, scope: &Name) -> Option<Self> {
        let (entity, signal) = match text.split_once('/') {
            Some((entity, signal)) => (entity, signal.trim()),
            None => (text, DEFAULT_SIGNAL_NAME),
        };
        let valid_signal = !signal.is_empty()
            && signal.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid_signal {
            return None;
        }
        Some(Self::new(EntityRef::resolve(entity, scope)?, signal))
    }

    /// The entity this signal belongs to
    pub fn entity(&self) -> &EntityRef {
        &self.entity
    }

    /// The signal's name on its entity
    pub fn signal_name(&self) -> &str {
        &self.signal
    }

    /// Read the current value
    ///
    /// Constants are returned as stored. Bindings are evaluated under the same
    /// lock, including every signal they read. Never-set signals read `0.0`.
    /// The result is always finite.
    pub fn get_signal<L: ReadSignals + ?Sized>(&self, lock: &L) -> f64 {
        self.get_signal_at(lock, 0)
    }

    pub(crate) fn get_signal_at<L: ReadSignals + ?Sized>(&self, lock: &L, depth: usize) -> f64 {
        let value = match lock.signals().get(self) {
            None => return 0.0,
            Some(Signal::Value(value)) => *value,
            Some(Signal::Binding(expr)) => expr.evaluate(lock, depth),
        };
        if value.is_finite() {
            value
        } else {
            0.0
        }
    }

    /// True if a constant value is stored (including a cleared `0.0`)
    pub fn has_value<L: ReadSignals + ?Sized>(&self, lock: &L) -> bool {
        matches!(lock.signals().get(self), Some(Signal::Value(_)))
    }

    /// True if an expression binding is stored, valid or not
    pub fn has_binding<L: ReadSignals + ?Sized>(&self, lock: &L) -> bool {
        matches!(lock.signals().get(self), Some(Signal::Binding(_)))
    }

    /// The stored binding, or [`Expression::EMPTY`] when there is none
    pub fn get_binding<'l, L: ReadSignals + ?Sized>(&self, lock: &'l L) -> &'l Expression {
        match lock.signals().get(self) {
            Some(Signal::Binding(expr)) => expr,
            _ => &EMPTY_BINDING,
        }
    }

    /// Store a constant, replacing any binding
    ///
    /// Non-finite values are stored as `0.0`.
    pub fn set_value(&self, lock: &mut WriteLock<'_>, value: f64) {
        let value = if value.is_finite() {
            value
        } else {
            tracing::warn!(signal = %self, value, "non-finite signal value stored as 0");
            0.0
        };
        lock.signals_mut().insert(self.clone(), Signal::Value(value));
    }

    /// Parse `text` relative to `scope` and store it as this signal's binding
    ///
    /// The expression is stored even when it fails to parse, in which case
    /// the signal reads `0.0` until it is rebound. The stored expression is
    /// returned for inspection.
    pub fn set_binding<'l>(
        &self,
        lock: &'l mut WriteLock<'_>,
        text: &str,
        scope: &Name,
    ) -> &'l Expression {
        self.set_binding_expr(lock, Expression::parse(text, scope))
    }

    /// Store an already parsed expression as this signal's binding
    pub fn set_binding_expr<'l>(
        &self,
        lock: &'l mut WriteLock<'_>,
        expr: Expression,
    ) -> &'l Expression {
        match lock.signals_mut().insert(self.clone(), Signal::Binding(expr)) {
            Signal::Binding(expr) => expr,
            Signal::Value(_) => &EMPTY_BINDING,
        }
    }

    /// Reset to the unset state, `Value(0.0)`
    pub fn clear_value(&self, lock: &mut WriteLock<'_>) {
        lock.signals_mut().insert(self.clone(), Signal::Value(0.0));
    }

    /// Drop a binding, leaving `Value(0.0)`; constants are left untouched
    pub fn clear_binding(&self, lock: &mut WriteLock<'_>) {
        if self.has_binding(&*lock) {
            self.clear_value(lock);
        }
    }
}

impl fmt::Display for SignalRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.entity, self.signal)
    }
}

/// Storage for every signal in a world
#[derive(Debug, Clone, Default)]
pub struct SignalStore {
    signals: IndexMap<SignalRef, Signal>,
}

impl SignalStore {
    /// Create a new empty signal store
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the stored state of a signal
    pub fn get(&self, signal: &SignalRef) -> Option<&Signal> {
        self.signals.get(signal)
    }

    /// Overwrite a signal in place and return the stored state
    pub(crate) fn insert(&mut self, signal: SignalRef, state: Signal) -> &mut Signal {
        let slot = self.signals.entry(signal).or_default();
        *slot = state;
        slot
    }

    /// Remove every signal stored under an entity name
    pub(crate) fn remove_entity(&mut self, name: &Name) -> usize {
        let before = self.signals.len();
        self.signals.retain(|signal, _| signal.entity().name() != name);
        before - self.signals.len()
    }

    /// All signals in the order they were first stored
    pub fn iter(&self) -> impl Iterator<Item = (&SignalRef, &Signal)> {
        self.signals.iter()
    }

    /// Get the number of stored signals
    pub fn len(&self) -> usize {
        self.signals.len()
    }

    /// Check if no signals are stored
    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{World, MAX_SIGNAL_BINDING_DEPTH};

    const TEST_SOURCE_BUTTON: &str = "device1_button";
    const TEST_SOURCE_KEY: &str = "device2_key";

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::TRACE)
            .try_init();
    }

    /// `player` and `hand` entities in scene `player`, with two source signals on `player`
    fn player_world() -> World {
        let world = World::new();
        {
            let mut lock = world.write();
            lock.spawn(Name::new("player", "player")).unwrap();
            lock.spawn(Name::new("player", "hand")).unwrap();
            let player = Name::new("player", "player");
            SignalRef::new(player.clone(), TEST_SOURCE_BUTTON).set_value(&mut lock, 1.0);
            SignalRef::new(player, TEST_SOURCE_KEY).set_value(&mut lock, 2.0);
        }
        world
    }

    #[test]
    fn test_parse() {
        let scope = Name::new("player", "hand");
        let signal = SignalRef::parse("player/device1_button", &scope).unwrap();
        assert_eq!(signal.entity().name(), &Name::new("player", "player"));
        assert_eq!(signal.signal_name(), TEST_SOURCE_BUTTON);

        let signal = SignalRef::parse("lobby:door", &scope).unwrap();
        assert_eq!(signal.to_string(), "lobby:door/value");

        assert!(SignalRef::parse("door/", &scope).is_none());
        assert!(SignalRef::parse("/value", &scope).is_none());
        assert!(SignalRef::parse("door/a b", &scope).is_none());
    }

    #[test]
    fn test_unset_signal_reads_zero_without_storing() {
        let world = World::new();
        let lock = world.read();
        let signal = SignalRef::new(Name::new("player", "nobody"), "foo");
        assert_eq!(signal.get_signal(&lock), 0.0);
        assert!(!signal.has_value(&lock));
        assert!(!signal.has_binding(&lock));
        assert!(lock.signals().is_empty());
    }

    #[test]
    fn test_value_and_binding_replace_each_other() {
        let world = player_world();
        let mut lock = world.write();
        let scope = Name::scope("player");
        let action = SignalRef::new(Name::new("player", "hand"), "action");

        action.set_value(&mut lock, 5.0);
        assert_eq!(action.get_signal(&lock), 5.0);

        action.set_binding(&mut lock, "player/device2_key * 10", &scope);
        assert_eq!(action.get_signal(&lock), 20.0);
        assert!(action.has_binding(&lock));
        assert!(!action.has_value(&lock));

        action.set_value(&mut lock, 3.0);
        assert_eq!(action.get_signal(&lock), 3.0);
        assert!(action.get_binding(&lock).is_empty());
    }

    #[test]
    fn test_clear() {
        let world = player_world();
        let mut lock = world.write();
        let action = SignalRef::new(Name::new("player", "hand"), "action");

        action.set_binding(&mut lock, "player/device1_button", &Name::scope("player"));
        action.clear_binding(&mut lock);
        assert_eq!(action.get_signal(&lock), 0.0);
        assert!(!action.has_binding(&lock));

        action.set_value(&mut lock, 4.0);
        action.clear_binding(&mut lock);
        assert_eq!(action.get_signal(&lock), 4.0);

        action.clear_value(&mut lock);
        assert_eq!(action.get_signal(&lock), 0.0);
    }

    #[test]
    fn test_scoped_resolution() {
        let world = player_world();
        let mut lock = world.write();
        let button = SignalRef::new(Name::new("player", "player"), TEST_SOURCE_BUTTON);
        let action = SignalRef::new(Name::new("player", "hand"), "action");

        let scope = Name::new("player", "hand");
        let expr = action.set_binding(&mut lock, "player/device1_button", &scope);
        assert!(expr.is_valid());
        assert_eq!(expr.signals().collect::<Vec<_>>(), vec![&button]);
        assert_eq!(action.get_signal(&lock), 1.0);

        // The owning entity's scene does not take part in resolution
        lock.spawn(Name::new("lobby", "hand")).unwrap();
        let remote = SignalRef::new(Name::new("lobby", "hand"), "action");
        let expr = remote.set_binding(&mut lock, "player/device1_button", &Name::scope("player"));
        assert_eq!(expr.signals().collect::<Vec<_>>(), vec![&button]);
        assert_eq!(expr.to_string(), "player:player/device1_button");
        assert_eq!(remote.get_signal(&lock), 1.0);
    }

    #[test]
    fn test_chained_bindings() {
        let world = player_world();
        let mut lock = world.write();
        let scope = Name::scope("player");
        let action1 = SignalRef::new(Name::new("player", "hand"), "test_action1");
        let action2 = SignalRef::new(Name::new("player", "hand"), "test_action2");
        let action3 = SignalRef::new(Name::new("player", "player"), "test_action3");

        action1.set_binding(&mut lock, "player/device2_key == 42", &scope);
        action2.set_binding(&mut lock, "hand/test_action1 + player/device1_button", &scope);
        action3.set_binding(
            &mut lock,
            "player/device2_key > max(player/device1_button, hand/test_action2)",
            &scope,
        );

        assert_eq!(action1.get_signal(&lock), 0.0);
        assert_eq!(action2.get_signal(&lock), 1.0);
        assert_eq!(action3.get_signal(&lock), 1.0);

        SignalRef::new(Name::new("player", "player"), TEST_SOURCE_KEY).set_value(&mut lock, 42.0);
        assert_eq!(action1.get_signal(&lock), 1.0);
        assert_eq!(action2.get_signal(&lock), 2.0);
        assert_eq!(action3.get_signal(&lock), 1.0);
    }

    #[test]
    fn test_missing_entity_reads_zero() {
        init_tracing();
        let world = player_world();
        let mut lock = world.write();
        let action = SignalRef::new(Name::new("player", "hand"), "action");

        action.set_binding(&mut lock, "missing_entity/missing_signal", &Name::scope("player"));
        assert!(action.get_binding(&lock).is_valid());
        assert_eq!(action.get_signal(&lock), 0.0);

        // The binding starts working once the entity exists
        let unknown = SignalRef::new(Name::new("player", "missing_entity"), "missing_signal");
        unknown.set_value(&mut lock, 5.0);
        assert_eq!(action.get_signal(&lock), 0.0);
        lock.spawn(Name::new("player", "missing_entity")).unwrap();
        assert_eq!(action.get_signal(&lock), 5.0);
    }

    #[test]
    fn test_self_reference_terminates() {
        init_tracing();
        let world = player_world();
        let mut lock = world.write();
        let signal = SignalRef::new(Name::new("player", "hand"), "counter");
        signal.set_binding(&mut lock, "hand/counter + 1", &Name::scope("player"));
        assert_eq!(signal.get_signal(&lock), MAX_SIGNAL_BINDING_DEPTH as f64 + 1.0);
    }

    #[test]
    fn test_mutual_recursion_terminates() {
        let world = player_world();
        let mut lock = world.write();
        let scope = Name::scope("player");
        let a = SignalRef::new(Name::new("player", "hand"), "a");
        let b = SignalRef::new(Name::new("player", "player"), "b");
        a.set_binding(&mut lock, "player/b * 2 + 1", &scope);
        b.set_binding(&mut lock, "hand/a", &scope);

        let value = a.get_signal(&lock);
        assert!(value.is_finite());
        assert_eq!(value, a.get_signal(&lock));
    }

    #[test]
    fn test_invalid_binding_is_stored() {
        let world = player_world();
        let mut lock = world.write();
        let action = SignalRef::new(Name::new("player", "hand"), "action");

        action.set_value(&mut lock, 7.0);
        let expr = action.set_binding(&mut lock, "max(signal,", &Name::scope("player"));
        assert!(!expr.is_valid());
        assert_eq!(expr.source(), "max(signal,");
        assert!(action.has_binding(&lock));
        assert_eq!(action.get_signal(&lock), 0.0);
    }

    #[test]
    fn test_non_finite_values_never_escape() {
        let world = player_world();
        let mut lock = world.write();
        let scope = Name::scope("player");
        let signal = SignalRef::new(Name::new("player", "hand"), "ratio");

        signal.set_value(&mut lock, f64::NAN);
        assert_eq!(signal.get_signal(&lock), 0.0);

        signal.set_binding(&mut lock, "player/device1_button / 0", &scope);
        assert_eq!(signal.get_signal(&lock), 0.0);
    }

    #[test]
    fn test_store_iteration_order() {
        let world = player_world();
        let lock = world.read();
        let names: Vec<&str> = lock.signals().iter().map(|(s, _)| s.signal_name()).collect();
        assert_eq!(names, vec![TEST_SOURCE_BUTTON, TEST_SOURCE_KEY]);
        assert_eq!(lock.signals().len(), 2);
    }
}
