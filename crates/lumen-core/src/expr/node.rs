//! Expression nodes stored in an [`Expression`](super::Expression) arena
//!
//! Nodes reference their operands by index into the same arena. Operands are
//! always pushed before the node that uses them, so every operand index is
//! smaller than the index of the node holding it.

use crate::SignalRef;
use std::fmt;

/// Index of a node within its expression's arena
pub type NodeIndex = usize;

/// Prefix operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `-x`
    Neg,
    /// `!x`
    Not,
}

/// Arithmetic operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

/// Comparison operators, producing `1.0` or `0.0`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// Boolean operators over "non-zero is true"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

/// Built-in math functions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Func {
    Cos,
    Sin,
    Tan,
    Acos,
    Atan2,
    Floor,
    Ceil,
    Abs,
    Max,
    Min,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
        }
    }

    pub fn apply(self, x: f64) -> f64 {
        match self {
            UnaryOp::Neg => -x,
            UnaryOp::Not => truth(x == 0.0),
        }
    }
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        }
    }

    /// IEEE arithmetic; division by zero is not guarded here
    pub fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            BinaryOp::Add => a + b,
            BinaryOp::Sub => a - b,
            BinaryOp::Mul => a * b,
            BinaryOp::Div => a / b,
        }
    }
}

impl CompareOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }

    pub fn apply(self, a: f64, b: f64) -> f64 {
        truth(match self {
            CompareOp::Eq => a == b,
            CompareOp::Ne => a != b,
            CompareOp::Lt => a < b,
            CompareOp::Le => a <= b,
            CompareOp::Gt => a > b,
            CompareOp::Ge => a >= b,
        })
    }
}

impl LogicalOp {
    pub fn symbol(self) -> &'static str {
        match self {
            LogicalOp::And => "&&",
            LogicalOp::Or => "||",
        }
    }

    pub fn apply(self, a: f64, b: f64) -> f64 {
        truth(match self {
            LogicalOp::And => a != 0.0 && b != 0.0,
            LogicalOp::Or => a != 0.0 || b != 0.0,
        })
    }
}

impl Func {
    /// Look up a function by the name used in expression text
    pub fn from_name(name: &str) -> Option<Func> {
        Some(match name {
            "cos" => Func::Cos,
            "sin" => Func::Sin,
            "tan" => Func::Tan,
            "acos" => Func::Acos,
            "atan2" => Func::Atan2,
            "floor" => Func::Floor,
            "ceil" => Func::Ceil,
            "abs" => Func::Abs,
            "max" => Func::Max,
            "min" => Func::Min,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            Func::Cos => "cos",
            Func::Sin => "sin",
            Func::Tan => "tan",
            Func::Acos => "acos",
            Func::Atan2 => "atan2",
            Func::Floor => "floor",
            Func::Ceil => "ceil",
            Func::Abs => "abs",
            Func::Max => "max",
            Func::Min => "min",
        }
    }

    /// Exact number of arguments the function takes
    pub fn arity(self) -> usize {
        match self {
            Func::Atan2 | Func::Max | Func::Min => 2,
            _ => 1,
        }
    }

    /// Apply to already-evaluated arguments; `args.len()` equals `arity()`
    pub fn apply(self, args: &[f64]) -> f64 {
        match (self, args) {
            (Func::Cos, [x]) => x.cos(),
            (Func::Sin, [x]) => x.sin(),
            (Func::Tan, [x]) => x.tan(),
            (Func::Acos, [x]) => x.acos(),
            (Func::Floor, [x]) => x.floor(),
            (Func::Ceil, [x]) => x.ceil(),
            (Func::Abs, [x]) => x.abs(),
            (Func::Atan2, [y, x]) => y.atan2(*x),
            (Func::Max, [a, b]) => a.max(*b),
            (Func::Min, [a, b]) => a.min(*b),
            _ => 0.0,
        }
    }
}

fn truth(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

/// The operation a node performs
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// A literal number
    Constant(f64),
    /// Read another signal, resolved against the authoring scope at parse time
    Signal(SignalRef),
    Unary {
        op: UnaryOp,
        operand: NodeIndex,
    },
    Binary {
        op: BinaryOp,
        lhs: NodeIndex,
        rhs: NodeIndex,
    },
    Compare {
        op: CompareOp,
        lhs: NodeIndex,
        rhs: NodeIndex,
    },
    Logical {
        op: LogicalOp,
        lhs: NodeIndex,
        rhs: NodeIndex,
    },
    /// `cond ? if_true : if_false`
    Ternary {
        cond: NodeIndex,
        if_true: NodeIndex,
        if_false: NodeIndex,
    },
    Call {
        func: Func,
        args: Vec<NodeIndex>,
    },
}

/// A node plus its rendered text
///
/// `text` is built bottom-up while parsing from the operands' text, keeps the
/// parentheses the author wrote, and parses back to an equivalent node.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub text: String,
}

impl Node {
    pub fn new(kind: NodeKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    /// Arena indices this node reads from, in evaluation order
    pub fn operands(&self) -> Vec<NodeIndex> {
        match &self.kind {
            NodeKind::Constant(_) | NodeKind::Signal(_) => Vec::new(),
            NodeKind::Unary { operand, .. } => vec![*operand],
            NodeKind::Binary { lhs, rhs, .. }
            | NodeKind::Compare { lhs, rhs, .. }
            | NodeKind::Logical { lhs, rhs, .. } => vec![*lhs, *rhs],
            NodeKind::Ternary {
                cond,
                if_true,
                if_false,
            } => vec![*cond, *if_true, *if_false],
            NodeKind::Call { args, .. } => args.clone(),
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
