//! Recursive-descent parser producing a flat node arena
//!
//! Precedence, lowest to highest:
//!
//! | level          | operators               | associativity |
//! |----------------|-------------------------|---------------|
//! | ternary        | `? :`                   | right         |
//! | logical or     | `\|\|`                  | left          |
//! | logical and    | `&&`                    | left          |
//! | equality       | `== !=`                 | left          |
//! | relational     | `< <= > >=`             | left          |
//! | additive       | `+ -`                   | left          |
//! | multiplicative | `* /`                   | left          |
//! | unary          | `! -`                   | right         |
//! | primary        | number, signal, call, `( )` |           |

use super::node::{BinaryOp, CompareOp, Func, LogicalOp, Node, NodeIndex, NodeKind, UnaryOp};
use super::token::{tokenize, Token, TokenKind};
use super::{MAX_EXPRESSION_NESTING, MAX_SIGNAL_EXPRESSION_NODES};
use crate::{Name, ParseError, SignalRef};

type ParseResult<T> = std::result::Result<T, ParseError>;

/// Parse expression text into `(arena, root)`
///
/// Empty or whitespace-only text parses to an empty arena with no root.
pub(crate) fn parse(src: &str, scope: &Name) -> ParseResult<(Vec<Node>, Option<NodeIndex>)> {
    let tokens = tokenize(src)?;
    if tokens.is_empty() {
        return Ok((Vec::new(), None));
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        nodes: Vec::new(),
        scope,
        depth: 0,
    };
    let root = parser.ternary()?;
    if let Some(token) = parser.peek() {
        return Err(ParseError::TrailingInput {
            token: token.text.to_string(),
            offset: token.offset,
        });
    }
    Ok((parser.nodes, Some(root)))
}

/// Binary precedence levels, lowest first
#[derive(Debug, Clone, Copy)]
enum Level {
    Or,
    And,
    Equality,
    Relational,
    Additive,
    Multiplicative,
}

#[derive(Debug, Clone, Copy)]
enum Infix {
    Binary(BinaryOp),
    Compare(CompareOp),
    Logical(LogicalOp),
}

impl Level {
    fn next(self) -> Option<Level> {
        match self {
            Level::Or => Some(Level::And),
            Level::And => Some(Level::Equality),
            Level::Equality => Some(Level::Relational),
            Level::Relational => Some(Level::Additive),
            Level::Additive => Some(Level::Multiplicative),
            Level::Multiplicative => None,
        }
    }

    fn op(self, kind: TokenKind<'_>) -> Option<Infix> {
        let infix = match (self, kind) {
            (Level::Or, TokenKind::OrOr) => Infix::Logical(LogicalOp::Or),
            (Level::And, TokenKind::AndAnd) => Infix::Logical(LogicalOp::And),
            (Level::Equality, TokenKind::EqEq) => Infix::Compare(CompareOp::Eq),
            (Level::Equality, TokenKind::NotEq) => Infix::Compare(CompareOp::Ne),
            (Level::Relational, TokenKind::Lt) => Infix::Compare(CompareOp::Lt),
            (Level::Relational, TokenKind::Le) => Infix::Compare(CompareOp::Le),
            (Level::Relational, TokenKind::Gt) => Infix::Compare(CompareOp::Gt),
            (Level::Relational, TokenKind::Ge) => Infix::Compare(CompareOp::Ge),
            (Level::Additive, TokenKind::Plus) => Infix::Binary(BinaryOp::Add),
            (Level::Additive, TokenKind::Minus) => Infix::Binary(BinaryOp::Sub),
            (Level::Multiplicative, TokenKind::Star) => Infix::Binary(BinaryOp::Mul),
            (Level::Multiplicative, TokenKind::Slash) => Infix::Binary(BinaryOp::Div),
            _ => return None,
        };
        Some(infix)
    }
}

impl Infix {
    fn symbol(self) -> &'static str {
        match self {
            Infix::Binary(op) => op.symbol(),
            Infix::Compare(op) => op.symbol(),
            Infix::Logical(op) => op.symbol(),
        }
    }

    fn node(self, lhs: NodeIndex, rhs: NodeIndex) -> NodeKind {
        match self {
            Infix::Binary(op) => NodeKind::Binary { op, lhs, rhs },
            Infix::Compare(op) => NodeKind::Compare { op, lhs, rhs },
            Infix::Logical(op) => NodeKind::Logical { op, lhs, rhs },
        }
    }
}

struct Parser<'a> {
    tokens: Vec<Token<'a>>,
    pos: usize,
    nodes: Vec<Node>,
    scope: &'a Name,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<Token<'a>> {
        self.tokens.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<Token<'a>> {
        let token = self.peek();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: TokenKind<'_>) -> bool {
        if self.peek().is_some_and(|t| t.kind == kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Consume a closing token that matches an opener at `open_offset`
    fn close(
        &mut self,
        kind: TokenKind<'_>,
        expected: char,
        open_offset: usize,
    ) -> ParseResult<()> {
        match self.next() {
            Some(token) if token.kind == kind => Ok(()),
            Some(token) => Err(ParseError::UnexpectedToken {
                token: token.text.to_string(),
                offset: token.offset,
            }),
            None => Err(ParseError::Unbalanced {
                expected,
                offset: open_offset,
            }),
        }
    }

    fn push(&mut self, kind: NodeKind, text: String) -> ParseResult<NodeIndex> {
        if self.nodes.len() >= MAX_SIGNAL_EXPRESSION_NODES {
            return Err(ParseError::TooManyNodes(MAX_SIGNAL_EXPRESSION_NODES));
        }
        self.nodes.push(Node::new(kind, text));
        Ok(self.nodes.len() - 1)
    }

    fn text(&self, index: NodeIndex) -> &str {
        &self.nodes[index].text
    }

    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        if self.depth >= MAX_EXPRESSION_NESTING {
            return Err(ParseError::TooDeep(MAX_EXPRESSION_NESTING));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn ternary(&mut self) -> ParseResult<NodeIndex> {
        self.nested(|p| {
            let cond = p.infix(Level::Or)?;
            let Some(question) = p.peek().filter(|t| t.kind == TokenKind::Question) else {
                return Ok(cond);
            };
            p.pos += 1;

            let if_true = p.ternary()?;
            p.close(TokenKind::Colon, ':', question.offset)?;
            let if_false = p.ternary()?;

            let text = format!(
                "{} ? {} : {}",
                p.text(cond),
                p.text(if_true),
                p.text(if_false)
            );
            p.push(
                NodeKind::Ternary {
                    cond,
                    if_true,
                    if_false,
                },
                text,
            )
        })
    }

    fn infix(&mut self, level: Level) -> ParseResult<NodeIndex> {
        let mut lhs = self.operand(level)?;
        while let Some(op) = self.peek().and_then(|t| level.op(t.kind)) {
            self.pos += 1;
            let rhs = self.operand(level)?;
            let text = format!("{} {} {}", self.text(lhs), op.symbol(), self.text(rhs));
            lhs = self.push(op.node(lhs, rhs), text)?;
        }
        Ok(lhs)
    }

    fn operand(&mut self, level: Level) -> ParseResult<NodeIndex> {
        match level.next() {
            Some(next) => self.infix(next),
            None => self.unary(),
        }
    }

    fn unary(&mut self) -> ParseResult<NodeIndex> {
        let op = match self.peek().map(|t| t.kind) {
            Some(TokenKind::Minus) => UnaryOp::Neg,
            Some(TokenKind::Bang) => UnaryOp::Not,
            _ => return self.primary(),
        };
        self.pos += 1;

        let operand = self.nested(|p| p.unary())?;
        let text = format!("{}{}", op.symbol(), self.text(operand));

        // Negated literals become a single constant in place of the operand
        if op == UnaryOp::Neg {
            if let NodeKind::Constant(value) = self.nodes[operand].kind {
                self.nodes[operand] = Node::new(NodeKind::Constant(-value), text);
                return Ok(operand);
            }
        }
        self.push(NodeKind::Unary { op, operand }, text)
    }

    fn primary(&mut self) -> ParseResult<NodeIndex> {
        let token = self.next().ok_or(ParseError::UnexpectedEnd)?;
        match token.kind {
            TokenKind::Number(value) => {
                self.push(NodeKind::Constant(value), token.text.to_string())
            }
            TokenKind::Signal(path) => {
                let signal = SignalRef::parse(path, self.scope)
                    .ok_or_else(|| ParseError::InvalidSignal(path.to_string()))?;
                let text = signal.to_string();
                self.push(NodeKind::Signal(signal), text)
            }
            TokenKind::LParen => {
                let inner = self.ternary()?;
                self.close(TokenKind::RParen, ')', token.offset)?;
                let node = &mut self.nodes[inner];
                node.text = format!("( {} )", node.text);
                Ok(inner)
            }
            TokenKind::Ident(name) => {
                let Some(open) = self.peek().filter(|t| t.kind == TokenKind::LParen) else {
                    return Err(ParseError::UnknownIdentifier(name.to_string()));
                };
                let func = Func::from_name(name)
                    .ok_or_else(|| ParseError::UnknownFunction(name.to_string()))?;
                self.pos += 1;
                self.call(func, open.offset)
            }
            _ => Err(ParseError::UnexpectedToken {
                token: token.text.to_string(),
                offset: token.offset,
            }),
        }
    }

    fn call(&mut self, func: Func, open_offset: usize) -> ParseResult<NodeIndex> {
        let mut args = Vec::with_capacity(func.arity());
        if !self.eat(TokenKind::RParen) {
            loop {
                args.push(self.ternary()?);
                if self.eat(TokenKind::Comma) {
                    continue;
                }
                self.close(TokenKind::RParen, ')', open_offset)?;
                break;
            }
        }

        if args.len() != func.arity() {
            return Err(ParseError::WrongArgCount {
                func: func.name(),
                expected: func.arity(),
                got: args.len(),
            });
        }

        let rendered: Vec<&str> = args.iter().map(|&arg| self.text(arg)).collect();
        let text = format!("{}( {} )", func.name(), rendered.join(" , "));
        self.push(NodeKind::Call { func, args }, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(src: &str) -> (Vec<Node>, NodeIndex) {
        let (nodes, root) = parse(src, &Name::scope("player")).unwrap();
        (nodes, root.unwrap())
    }

    #[test]
    fn test_operands_precede_operators() {
        let (nodes, root) = parse_ok("a/x * 2 + (b/y > 1 ? max(1, c/z) : -a/x)");
        assert_eq!(root, nodes.len() - 1);
        for (index, node) in nodes.iter().enumerate() {
            assert!(node.operands().iter().all(|&operand| operand < index));
        }
    }

    #[test]
    fn test_precedence_shape() {
        let (nodes, root) = parse_ok("1 + 2 * 3 == 7 && 1 || 0");
        let NodeKind::Logical { op: LogicalOp::Or, lhs, .. } = nodes[root].kind else {
            panic!("expected || at root, got {:?}", nodes[root].kind);
        };
        let NodeKind::Logical { op: LogicalOp::And, lhs, .. } = nodes[lhs].kind else {
            panic!("expected && under ||");
        };
        let NodeKind::Compare { op: CompareOp::Eq, lhs, .. } = nodes[lhs].kind else {
            panic!("expected == under &&");
        };
        let NodeKind::Binary { op: BinaryOp::Add, rhs, .. } = nodes[lhs].kind else {
            panic!("expected + under ==");
        };
        assert!(matches!(nodes[rhs].kind, NodeKind::Binary { op: BinaryOp::Mul, .. }));
    }

    #[test]
    fn test_left_associative_subtraction() {
        let (nodes, root) = parse_ok("8 - 4 - 2");
        let NodeKind::Binary { op: BinaryOp::Sub, lhs, rhs } = nodes[root].kind else {
            panic!("expected - at root");
        };
        assert!(matches!(nodes[lhs].kind, NodeKind::Binary { op: BinaryOp::Sub, .. }));
        assert_eq!(nodes[rhs].kind, NodeKind::Constant(2.0));
    }

    #[test]
    fn test_ternary_is_right_associative() {
        let (nodes, root) = parse_ok("0 ? 1 : 0 ? 2 : 3");
        let NodeKind::Ternary { if_false, .. } = nodes[root].kind else {
            panic!("expected ternary at root");
        };
        assert!(matches!(nodes[if_false].kind, NodeKind::Ternary { .. }));
    }

    #[test]
    fn test_negative_literal_folds() {
        let (nodes, root) = parse_ok("-1.5");
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[root].kind, NodeKind::Constant(-1.5));
        assert_eq!(nodes[root].text, "-1.5");

        let (nodes, root) = parse_ok("-a/b");
        assert_eq!(nodes.len(), 2);
        assert!(matches!(nodes[root].kind, NodeKind::Unary { op: UnaryOp::Neg, .. }));
    }

    #[test]
    fn test_signal_resolved_against_scope() {
        let (nodes, root) = parse_ok("hand/grip");
        let NodeKind::Signal(signal) = &nodes[root].kind else {
            panic!("expected signal node");
        };
        assert_eq!(signal.entity().name(), &Name::new("player", "hand"));
        assert_eq!(signal.signal_name(), "grip");
        assert_eq!(nodes[root].text, "player:hand/grip");
    }

    #[test]
    fn test_node_text() {
        let (nodes, root) = parse_ok("max(1,(2+3)) * -x/y");
        assert_eq!(nodes[root].text, "max( 1 , ( 2 + 3 ) ) * -player:x/y");
    }

    #[test]
    fn test_errors() {
        let scope = Name::scope("player");
        assert_eq!(parse("cos(", &scope), Err(ParseError::UnexpectedEnd));
        assert_eq!(
            parse("max(signal,", &scope),
            Err(ParseError::UnknownIdentifier("signal".to_string()))
        );
        assert_eq!(parse("-", &scope), Err(ParseError::UnexpectedEnd));
        assert_eq!(
            parse("50 10", &scope),
            Err(ParseError::TrailingInput {
                token: "10".to_string(),
                offset: 3
            })
        );
        assert_eq!(
            parse("()", &scope),
            Err(ParseError::UnexpectedToken {
                token: ")".to_string(),
                offset: 1
            })
        );
        assert_eq!(
            parse("sin()", &scope),
            Err(ParseError::WrongArgCount {
                func: "sin",
                expected: 1,
                got: 0
            })
        );
        assert_eq!(
            parse("(1 + 2", &scope),
            Err(ParseError::Unbalanced {
                expected: ')',
                offset: 0
            })
        );
        assert_eq!(
            parse("1 ? 2", &scope),
            Err(ParseError::Unbalanced {
                expected: ':',
                offset: 2
            })
        );
        assert_eq!(
            parse("sqrt(4)", &scope),
            Err(ParseError::UnknownFunction("sqrt".to_string()))
        );
        assert_eq!(
            parse("max(1, 2, 3)", &scope),
            Err(ParseError::WrongArgCount {
                func: "max",
                expected: 2,
                got: 3
            })
        );
    }

    #[test]
    fn test_nesting_limit() {
        let deep = format!(
            "{}1{}",
            "(".repeat(MAX_EXPRESSION_NESTING + 1),
            ")".repeat(MAX_EXPRESSION_NESTING + 1)
        );
        assert_eq!(
            parse(&deep, &Name::default()),
            Err(ParseError::TooDeep(MAX_EXPRESSION_NESTING))
        );

        let negations = format!("{}1", "!".repeat(MAX_EXPRESSION_NESTING * 2));
        assert_eq!(
            parse(&negations, &Name::default()),
            Err(ParseError::TooDeep(MAX_EXPRESSION_NESTING))
        );

        let shallow = format!("{}1{}", "(".repeat(8), ")".repeat(8));
        assert!(parse(&shallow, &Name::default()).is_ok());
    }
}
