//! Expression evaluation against a read lock

use super::node::{Node, NodeIndex, NodeKind};
use super::{Expression, MAX_SIGNAL_BINDING_DEPTH};
use crate::ReadSignals;

impl Expression {
    /// Evaluate against the signals visible through `lock`
    ///
    /// `depth` is the number of signal lookups already in progress above this
    /// evaluation. Signal nodes at or beyond [`MAX_SIGNAL_BINDING_DEPTH`] read
    /// as `0.0`, which is what terminates self-referencing bindings.
    ///
    /// Invalid and empty expressions evaluate to `0.0`. Non-finite
    /// intermediate results are replaced with `0.0` where they are produced.
    pub fn evaluate<L: ReadSignals + ?Sized>(&self, lock: &L, depth: usize) -> f64 {
        match self.root {
            Some(root) if self.is_valid() => Evaluator {
                nodes: &self.nodes,
                lock,
                depth,
            }
            .eval(root),
            _ => 0.0,
        }
    }
}

struct Evaluator<'a, L: ?Sized> {
    nodes: &'a [Node],
    lock: &'a L,
    depth: usize,
}

impl<L: ReadSignals + ?Sized> Evaluator<'_, L> {
    fn eval(&self, index: NodeIndex) -> f64 {
        let Some(node) = self.nodes.get(index) else {
            return 0.0;
        };

        let value = match &node.kind {
            NodeKind::Constant(value) => *value,
            NodeKind::Signal(signal) => {
                if self.depth >= MAX_SIGNAL_BINDING_DEPTH {
                    tracing::trace!(
                        signal = %signal,
                        depth = self.depth,
                        "signal binding depth cutoff"
                    );
                    0.0
                } else if !self.lock.entity_exists(signal.entity()) {
                    tracing::trace!(signal = %signal, "signal references a missing entity");
                    0.0
                } else {
                    signal.get_signal_at(self.lock, self.depth + 1)
                }
            }
            NodeKind::Unary { op, operand } => op.apply(self.eval(*operand)),
            NodeKind::Binary { op, lhs, rhs } => {
                let a = self.eval(*lhs);
                op.apply(a, self.eval(*rhs))
            }
            NodeKind::Compare { op, lhs, rhs } => {
                let a = self.eval(*lhs);
                op.apply(a, self.eval(*rhs))
            }
            NodeKind::Logical { op, lhs, rhs } => {
                let a = self.eval(*lhs);
                op.apply(a, self.eval(*rhs))
            }
            NodeKind::Ternary {
                cond,
                if_true,
                if_false,
            } => {
                if self.eval(*cond) != 0.0 {
                    self.eval(*if_true)
                } else {
                    self.eval(*if_false)
                }
            }
            NodeKind::Call { func, args } => {
                let mut values = [0.0; 2];
                for (slot, &arg) in values.iter_mut().zip(args) {
                    *slot = self.eval(arg);
                }
                func.apply(&values[..args.len().min(values.len())])
            }
        };

        if value.is_finite() {
            value
        } else {
            tracing::debug!(
                node = %node.text,
                value,
                "non-finite signal expression result read as 0"
            );
            0.0
        }
    }
}
