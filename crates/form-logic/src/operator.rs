use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Closed set of comparison operators a condition row can use.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "camelCase")]
pub enum OperatorCode {
    Empty,
    NotEmpty,
    Equals,
    NotEquals,
    GreaterThan,
    GreaterOrEqualsThan,
    LessThan,
    LessOrEqualsThan,
    Contains,
}

impl OperatorCode {
    pub const ALL: [OperatorCode; 9] = [
        OperatorCode::Empty,
        OperatorCode::NotEmpty,
        OperatorCode::Equals,
        OperatorCode::NotEquals,
        OperatorCode::GreaterThan,
        OperatorCode::GreaterOrEqualsThan,
        OperatorCode::LessThan,
        OperatorCode::LessOrEqualsThan,
        OperatorCode::Contains,
    ];

    /// Token used for this operator inside an expression string.
    pub fn token(self) -> &'static str {
        match self {
            OperatorCode::Empty => "$empty",
            OperatorCode::NotEmpty => "!$empty",
            OperatorCode::Equals => "==",
            OperatorCode::NotEquals => "!=",
            OperatorCode::GreaterThan => ">",
            OperatorCode::GreaterOrEqualsThan => ">=",
            OperatorCode::LessThan => "<",
            OperatorCode::LessOrEqualsThan => "<=",
            OperatorCode::Contains => "$contains",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.token() == token)
    }

    /// Wire code, as stored in a serialized condition row.
    pub fn code(self) -> &'static str {
        match self {
            OperatorCode::Empty => "empty",
            OperatorCode::NotEmpty => "notEmpty",
            OperatorCode::Equals => "equals",
            OperatorCode::NotEquals => "notEquals",
            OperatorCode::GreaterThan => "greaterThan",
            OperatorCode::GreaterOrEqualsThan => "greaterOrEqualsThan",
            OperatorCode::LessThan => "lessThan",
            OperatorCode::LessOrEqualsThan => "lessOrEqualsThan",
            OperatorCode::Contains => "contains",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.code() == code)
    }

    /// Default English label used by [`crate::describe`].
    pub fn label(self) -> &'static str {
        match self {
            OperatorCode::Empty => "is empty",
            OperatorCode::NotEmpty => "is not empty",
            OperatorCode::Equals => "equals",
            OperatorCode::NotEquals => "does not equal",
            OperatorCode::GreaterThan => "is greater than",
            OperatorCode::GreaterOrEqualsThan => "is greater than or equal to",
            OperatorCode::LessThan => "is less than",
            OperatorCode::LessOrEqualsThan => "is less than or equal to",
            OperatorCode::Contains => "contains",
        }
    }

    /// Operators that hold their operands in `values` instead of `value`.
    pub fn is_multi_value(self) -> bool {
        matches!(self, OperatorCode::Equals | OperatorCode::NotEquals)
    }

    pub fn takes_value(self) -> bool {
        !matches!(self, OperatorCode::Empty | OperatorCode::NotEmpty)
    }
}
