use std::path::PathBuf;

use form_logic::LogicError;
use thiserror::Error;

/// Failures reported by [`crate::FieldTree`] operations. The tree is left
/// unchanged whenever one of these is returned.
#[derive(Debug, Error)]
pub enum TreeError {
    #[error("field name must not be empty")]
    EmptyName,
    #[error("field name '{name}' must not contain whitespace or any of ( ) , $ \"")]
    InvalidName { name: String },
    #[error("field name '{name}' is already in use")]
    DuplicateName { name: String },
    #[error("the form already has a stepper")]
    StepperExists,
    #[error("the form has no stepper")]
    NoStepper,
    #[error("a stepper must keep at least one step")]
    LastStep,
    #[error("unknown step '{name}'")]
    StepNotFound { name: String },
    #[error("unknown field '{name}'")]
    FieldNotFound { name: String },
    #[error("no field is selected")]
    NoActiveField,
    #[error("property '{property}' cannot be patched directly")]
    ReservedProperty { property: String },
    #[error("invalid value for property '{property}': {source}")]
    InvalidProperty {
        property: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Logic(#[from] LogicError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}
