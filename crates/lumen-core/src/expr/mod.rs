//! Signal expression language
//!
//! A binding is authored as text such as `player/button > 0.5 ? 1 : lamp/dim`
//! and parsed once into an [`Expression`]: a flat arena of [`Node`]s plus a
//! root index. Signal references inside the text are resolved against the
//! authoring scope at parse time. The expression is then evaluated against a
//! read lock as often as needed.
//!
//! Parsing never fails loudly. Malformed text produces an expression that
//! keeps its source, reports [`Expression::error`] and evaluates to `0.0`.

mod eval;
mod node;
mod parser;
mod token;

pub use node::{BinaryOp, CompareOp, Func, LogicalOp, Node, NodeIndex, NodeKind, UnaryOp};

use crate::{Name, ParseError, SignalRef};
use std::fmt;

/// Signal lookups nested deeper than this read as `0.0`
pub const MAX_SIGNAL_BINDING_DEPTH: usize = 5;

/// Maximum number of nodes in one expression arena
pub const MAX_SIGNAL_EXPRESSION_NODES: usize = 256;

/// Maximum nesting of parentheses, unary operators and ternaries
pub const MAX_EXPRESSION_NESTING: usize = 64;

/// A compiled signal expression
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Expression {
    /// Text exactly as authored
    source: String,
    /// Scope relative names were resolved against
    scope: Name,
    /// Node arena; operands always precede their users
    nodes: Vec<Node>,
    root: Option<NodeIndex>,
    error: Option<ParseError>,
}

impl Expression {
    /// An empty expression, evaluating to `0.0`
    pub const EMPTY: Expression = Expression {
        source: String::new(),
        scope: Name {
            scene: String::new(),
            entity: String::new(),
        },
        nodes: Vec::new(),
        root: None,
        error: None,
    };

    /// Parse expression text relative to an authoring scope
    ///
    /// Always returns an expression. On failure the arena is discarded, the
    /// source is kept, and [`Expression::is_valid`] returns false.
    pub fn parse(source: impl Into<String>, scope: &Name) -> Self {
        let source = source.into();
        match parser::parse(&source, scope) {
            Ok((nodes, root)) => Self {
                source,
                scope: scope.clone(),
                nodes,
                root,
                error: None,
            },
            Err(error) => {
                tracing::warn!(
                    expr = %source,
                    scope = %scope,
                    %error,
                    "failed to parse signal expression"
                );
                Self {
                    source,
                    scope: scope.clone(),
                    nodes: Vec::new(),
                    root: None,
                    error: Some(error),
                }
            }
        }
    }

    /// A single-node expression that reads another signal
    pub fn from_signal(signal: SignalRef) -> Self {
        let text = signal.to_string();
        Self {
            source: text.clone(),
            scope: signal.entity().name().clone(),
            nodes: vec![Node::new(NodeKind::Signal(signal), text)],
            root: Some(0),
            error: None,
        }
    }

    /// The authored text
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The scope relative names were resolved against
    pub fn scope(&self) -> &Name {
        &self.scope
    }

    /// The node arena
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Index of the root node, `None` when empty or invalid
    pub fn root(&self) -> Option<NodeIndex> {
        self.root
    }

    pub fn root_node(&self) -> Option<&Node> {
        self.root.and_then(|root| self.nodes.get(root))
    }

    /// False when the source failed to parse
    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }

    /// Why the source failed to parse
    pub fn error(&self) -> Option<&ParseError> {
        self.error.as_ref()
    }

    /// True for an expression with no nodes (empty text or a parse failure)
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// All signals this expression reads, in arena order
    pub fn signals(&self) -> impl Iterator<Item = &SignalRef> {
        self.nodes.iter().filter_map(|node| match &node.kind {
            NodeKind::Signal(signal) => Some(signal),
            _ => None,
        })
    }

    /// Text suitable for storing under another scope
    ///
    /// Returns the source unchanged when `scope` is in the same scene as the
    /// authoring scope. Otherwise relative names would change meaning, so the
    /// fully-qualified rendering of the root node is returned instead.
    pub fn to_scoped_string(&self, scope: &Name) -> String {
        if scope.scene == self.scope.scene {
            return self.source.clone();
        }
        match self.root_node() {
            Some(root) => root.text.clone(),
            None => self.source.clone(),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.root_node() {
            Some(root) => f.write_str(&root.text),
            None => f.write_str(&self.source),
        }
    }
}
