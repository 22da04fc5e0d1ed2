#![allow(missing_docs)]

pub mod compile;
pub mod decompile;
pub mod describe;
pub mod error;
pub mod field;
pub mod lexer;
pub mod operator;
pub mod references;

pub use compile::{LogicTarget, compile, compile_for};
pub use decompile::{decompile, parse};
pub use describe::{describe, describe_with};
pub use error::LogicError;
pub use field::LogicField;
pub use operator::OperatorCode;
pub use references::{
    Pruned, mentions, prune_references, references, remap_references, rename_references,
};
