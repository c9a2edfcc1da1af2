//! Tokenizer for signal expression text

use crate::ParseError;

/// Kinds of token produced by [`tokenize`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenKind<'a> {
    Number(f64),
    /// `entity/signal` or `scene:entity/signal`
    Signal(&'a str),
    /// A bare word; only valid as a function name
    Ident(&'a str),
    Plus,
    Minus,
    Star,
    Slash,
    Bang,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    AndAnd,
    OrOr,
    Question,
    Colon,
    LParen,
    RParen,
    Comma,
}

/// A token with the byte offset where it starts
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token<'a> {
    pub kind: TokenKind<'a>,
    pub text: &'a str,
    pub offset: usize,
}

fn is_word_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_' || c == b'.'
}

fn is_signal_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_'
}

fn is_numeric(word: &str) -> bool {
    matches!(word.as_bytes().first(), Some(c) if c.is_ascii_digit() || *c == b'.')
}

/// Split expression text into tokens
///
/// A run of `[A-Za-z0-9_.:]` directly followed by `/` and a signal name is a
/// single signal token, so `player/button` never tokenizes as a division. A
/// run that starts like a number is always a number, and may carry a signed
/// exponent (`1e-3`, `2.5E+1`). Outside of signal paths `:` is the ternary
/// separator.
pub fn tokenize(src: &str) -> Result<Vec<Token<'_>>, ParseError> {
    let bytes = src.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        if c.is_ascii_whitespace() {
            i += 1;
            continue;
        }

        if is_word_char(c) {
            let numeric = c.is_ascii_digit() || c == b'.';
            let mut run_end = i;
            while run_end < bytes.len() {
                let b = bytes[run_end];
                let exponent_sign = numeric
                    && matches!(b, b'+' | b'-')
                    && matches!(bytes[run_end - 1], b'e' | b'E')
                    && bytes.get(run_end + 1).is_some_and(u8::is_ascii_digit);
                if !(is_word_char(b) || b == b':' || exponent_sign) {
                    break;
                }
                run_end += 1;
            }
            let run = &src[i..run_end];

            let is_path = !numeric
                && bytes.get(run_end) == Some(&b'/')
                && bytes.get(run_end + 1).copied().is_some_and(is_signal_char);
            if is_path {
                let mut end = run_end + 1;
                while end < bytes.len() && is_signal_char(bytes[end]) {
                    end += 1;
                }
                tokens.push(Token {
                    kind: TokenKind::Signal(&src[i..end]),
                    text: &src[i..end],
                    offset: i,
                });
                i = end;
                continue;
            }

            let word_end = run.find(':').map_or(run_end, |colon| i + colon);
            let word = &src[i..word_end];
            let kind = if is_numeric(word) {
                match word.parse::<f64>() {
                    Ok(value) => TokenKind::Number(value),
                    Err(_) => {
                        return Err(ParseError::UnexpectedToken {
                            token: word.to_string(),
                            offset: i,
                        })
                    }
                }
            } else {
                TokenKind::Ident(word)
            };
            tokens.push(Token {
                kind,
                text: word,
                offset: i,
            });
            i = word_end;
            continue;
        }

        let next = bytes.get(i + 1).copied();
        let (kind, len) = match (c, next) {
            (b'=', Some(b'=')) => (TokenKind::EqEq, 2),
            (b'!', Some(b'=')) => (TokenKind::NotEq, 2),
            (b'<', Some(b'=')) => (TokenKind::Le, 2),
            (b'>', Some(b'=')) => (TokenKind::Ge, 2),
            (b'&', Some(b'&')) => (TokenKind::AndAnd, 2),
            (b'|', Some(b'|')) => (TokenKind::OrOr, 2),
            (b'+', _) => (TokenKind::Plus, 1),
            (b'-', _) => (TokenKind::Minus, 1),
            (b'*', _) => (TokenKind::Star, 1),
            (b'/', _) => (TokenKind::Slash, 1),
            (b'!', _) => (TokenKind::Bang, 1),
            (b'<', _) => (TokenKind::Lt, 1),
            (b'>', _) => (TokenKind::Gt, 1),
            (b'?', _) => (TokenKind::Question, 1),
            (b':', _) => (TokenKind::Colon, 1),
            (b'(', _) => (TokenKind::LParen, 1),
            (b')', _) => (TokenKind::RParen, 1),
            (b',', _) => (TokenKind::Comma, 1),
            _ => {
                let ch = src[i..].chars().next().unwrap_or('\u{fffd}');
                return Err(ParseError::UnexpectedChar { ch, offset: i });
            }
        };
        tokens.push(Token {
            kind,
            text: &src[i..i + len],
            offset: i,
        });
        i += len;
    }

    Ok(tokens)
}
