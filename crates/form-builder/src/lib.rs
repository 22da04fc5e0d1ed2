#![allow(missing_docs)]

pub mod check;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod dnd;
pub mod error;
pub mod field;
pub mod history;
pub mod palette;
pub mod preview;
pub mod registry;
pub mod rules;
pub mod session;
pub mod tree;

pub use check::{Issue, check};
pub use config::EditorConfig;
pub use dnd::{DragReorderController, DropIndicator};
pub use error::{ConfigError, TreeError};
pub use field::{Align, ColumnSpec, Field, Span, Step, Toggle, Validation, Viewport};
pub use history::HistoryLedger;
pub use palette::palette;
pub use preview::{PreviewMode, preview};
pub use registry::{NameRegistry, strip_numeric_suffix, validate_name};
pub use rules::{LengthLimits, length_limits};
pub use session::{Change, EditorSession};
pub use tree::{FieldRef, FieldTree, Selection, StepPatch};

/// JSON Schema of the persisted layout: an array of fields.
pub fn layout_schema() -> schemars::Schema {
    schemars::schema_for!(Vec<Field>)
}
