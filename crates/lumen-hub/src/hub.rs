//! Hub - Owner of the world and batch signal reads
//!
//! The hub holds the [`World`] and evaluates many signals under one read
//! lock. Every value in a batch therefore comes from the same consistent
//! view of the world, even when the batch is spread across threads.

use crate::config::EvalConfig;
use lumen_core::{SignalRef, World};
use std::{panic, thread};

/// Owner of a [`World`] with configurable batch evaluation
///
/// ```
/// use lumen_core::{Name, SignalRef, World};
/// use lumen_hub::Hub;
///
/// let hub = Hub::new(World::new());
/// {
///     let mut lock = hub.world().write();
///     lock.spawn(Name::new("player", "hand")).unwrap();
///     SignalRef::new(Name::new("player", "hand"), "grip").set_value(&mut lock, 0.5);
/// }
///
/// let values = hub.evaluate_batch(&[
///     SignalRef::new(Name::new("player", "hand"), "grip"),
///     SignalRef::new(Name::new("player", "hand"), "missing"),
/// ]);
/// assert_eq!(values, vec![0.5, 0.0]);
/// ```
pub struct Hub {
    world: World,
    config: EvalConfig,
}

impl Hub {
    /// Create a hub that evaluates batches inline
    pub fn new(world: World) -> Self {
        Self::with_config(world, EvalConfig::default())
    }

    pub fn with_config(world: World, config: EvalConfig) -> Self {
        Self { world, config }
    }

    /// The owned world; acquire locks through it
    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    /// Set the number of batch workers, clamped to `[1, max_workers()]`
    pub fn set_worker_count(&mut self, n: usize) {
        self.config.set_worker_count(n);
    }

    /// Read every signal in `signals` under a single read lock
    ///
    /// Results are in input order. Each value equals
    /// [`SignalRef::get_signal`] under that lock.
    pub fn evaluate_batch(&self, signals: &[SignalRef]) -> Vec<f64> {
        let lock = self.world.read();
        let workers = self.config.worker_count().min(signals.len());
        if workers <= 1 {
            return signals.iter().map(|signal| signal.get_signal(&lock)).collect();
        }

        let chunk_size = signals.len().div_ceil(workers);
        tracing::trace!(signals = signals.len(), workers, chunk_size, "evaluating signal batch");

        let lock = &lock;
        thread::scope(|s| {
            let handles: Vec<_> = signals
                .chunks(chunk_size)
                .map(|chunk| {
                    s.spawn(move || {
                        chunk
                            .iter()
                            .map(|signal| signal.get_signal(lock))
                            .collect::<Vec<_>>()
                    })
                })
                .collect();

            let mut values = Vec::with_capacity(signals.len());
            for handle in handles {
                match handle.join() {
                    Ok(chunk) => values.extend(chunk),
                    Err(payload) => panic::resume_unwind(payload),
                }
            }
            values
        })
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new(World::new())
    }
}

impl std::fmt::Debug for Hub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hub")
            .field("worker_count", &self.config.worker_count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::max_workers;
    use lumen_core::{Name, ReadSignals};

    /// A scene with `count` dials, each with a constant `angle` and a bound
    /// `scaled` signal, plus one self-referencing counter.
    fn dial_hub(count: usize) -> (Hub, Vec<SignalRef>) {
        let hub = Hub::default();
        let scope = Name::scope("panel");
        let mut signals = Vec::new();
        {
            let mut lock = hub.world().write();
            for i in 0..count {
                let name = Name::new("panel", format!("dial{i}"));
                lock.spawn(name.clone()).unwrap();
                SignalRef::new(name.clone(), "angle").set_value(&mut lock, i as f64);
                SignalRef::new(name.clone(), "scaled").set_binding(
                    &mut lock,
                    &format!("dial{i}/angle * 2 + 1"),
                    &scope,
                );
                signals.push(SignalRef::new(name.clone(), "scaled"));
                signals.push(SignalRef::new(name, "angle"));
            }
            lock.spawn(Name::new("panel", "counter")).unwrap();
            let counter = SignalRef::new(Name::new("panel", "counter"), "value");
            counter.set_binding(&mut lock, "counter/value + 1", &scope);
            signals.push(counter);
        }
        (hub, signals)
    }

    #[test]
    fn test_default_is_inline() {
        let hub = Hub::default();
        assert!(hub.config().is_inline());
        assert_eq!(hub.world().read().entities().len(), 0);
    }

    #[test]
    fn test_set_worker_count() {
        let mut hub = Hub::default();
        hub.set_worker_count(4);
        assert_eq!(hub.config().worker_count(), 4.min(max_workers()));
        hub.set_worker_count(0);
        assert_eq!(hub.config().worker_count(), 1);
    }

    #[test]
    fn test_batch_matches_single_reads() {
        let (hub, signals) = dial_hub(10);
        let expected: Vec<f64> = {
            let lock = hub.world().read();
            signals.iter().map(|signal| signal.get_signal(&lock)).collect()
        };
        assert_eq!(expected[0], 1.0);
        assert_eq!(expected[2], 3.0);
        assert_eq!(*expected.last().unwrap(), 6.0);

        assert_eq!(hub.evaluate_batch(&signals), expected);
    }

    #[test]
    fn test_batch_order_independent_of_workers() {
        let (mut hub, signals) = dial_hub(25);
        let inline = hub.evaluate_batch(&signals);

        hub.set_worker_count(max_workers());
        assert_eq!(hub.evaluate_batch(&signals), inline);

        let config = EvalConfig::with_worker_count(3);
        let hub = Hub::with_config(World::new(), config);
        assert!(hub.evaluate_batch(&[]).is_empty());
    }
}
