//! Tokenizer for the condition expression format.
//!
//! Whitespace is lexed as trivia and dropped by [`lex`]. Characters that do
//! not start any token come back as [`TokenKind::Error`]; the parser keeps
//! them as part of free-text values since operands are read back from the
//! source slice, not from token kinds.

use std::ops::Range;

use logos::Logos;

/// Characters that end a `$name` reference. Field names must not contain
/// them or whitespace.
pub const NAME_DELIMITERS: [char; 5] = ['(', ')', ',', '$', '"'];

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    #[regex(r"[ \t\r\n]+")]
    Whitespace,

    #[token("&&")]
    AndAnd,
    #[token("||")]
    OrOr,

    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token(">=")]
    GtEq,
    #[token("<=")]
    LtEq,
    #[token(">")]
    Gt,
    #[token("<")]
    Lt,

    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(",")]
    Comma,

    #[token("$empty")]
    EmptyFn,
    #[token("!$empty")]
    NotEmptyFn,
    #[token("$contains")]
    ContainsFn,

    /// Field reference: `$` followed by a field name.
    #[regex(r#"\$[^ \t\r\n(),$"]+"#)]
    Var,

    /// Double-quoted operand with `\"` and `\\` escapes.
    #[regex(r#""([^"\\]|\\.)*""#)]
    Str,

    #[regex(r#"[^ \t\r\n(),$"&|=!<>]+"#)]
    Word,

    Error,
}

impl TokenKind {
    /// Tokens that only appear on the left of a condition.
    pub fn is_reference(self) -> bool {
        matches!(
            self,
            TokenKind::Var | TokenKind::EmptyFn | TokenKind::NotEmptyFn | TokenKind::ContainsFn
        )
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            TokenKind::EqEq
                | TokenKind::NotEq
                | TokenKind::GtEq
                | TokenKind::LtEq
                | TokenKind::Gt
                | TokenKind::Lt
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Range<usize>,
}

/// Lexes `source`, dropping whitespace.
pub fn lex(source: &str) -> Vec<Token> {
    TokenKind::lexer(source)
        .spanned()
        .map(|(kind, span)| Token {
            kind: kind.unwrap_or(TokenKind::Error),
            span,
        })
        .filter(|token| token.kind != TokenKind::Whitespace)
        .collect()
}

/// Reads the contents of a [`TokenKind::Str`] slice.
pub fn unquote(slice: &str) -> String {
    let inner = slice
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(slice);
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            out.push(ch);
        }
    }
    out
}

/// Wraps an operand in quotes when its plain form would not read back intact.
pub fn quote_if_needed(value: &str) -> String {
    let needs_quotes = value != value.trim()
        || value.contains("&&")
        || value.contains("||")
        || value.contains(['"', ',', '(', ')', '$']);
    if !needs_quotes {
        return value.to_string();
    }
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        if matches!(ch, '"' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('"');
    out
}
