use thiserror::Error;

/// Errors raised while reading an expression string back into condition rows.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LogicError {
    #[error("invalid condition format: {condition}")]
    UnrecognizedCondition { condition: String },
    #[error("unterminated string literal at byte {position}")]
    UnterminatedString { position: usize },
    #[error("empty condition at byte {position}")]
    EmptyCondition { position: usize },
}
