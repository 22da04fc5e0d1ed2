use schemars::JsonSchema;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use crate::operator::OperatorCode;

/// One editable condition row.
///
/// Top-level rows in a list are AND-ed together; the rows in `or` are
/// alternatives OR-ed with their parent. Equality operators keep their
/// operands in `values`, every other operator in `value`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct LogicField {
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "operator_or_blank")]
    pub operator: Option<OperatorCode>,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub values: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub or: Vec<LogicField>,
}

impl LogicField {
    /// Row for a single-operand operator (`contains`, comparisons) or a
    /// value-less one (`empty`, `notEmpty`, pass an empty value).
    pub fn new(name: impl Into<String>, operator: OperatorCode, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            operator: Some(operator),
            value: value.into(),
            values: Vec::new(),
            or: Vec::new(),
        }
    }

    pub fn multi<I, S>(name: impl Into<String>, operator: OperatorCode, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            operator: Some(operator),
            value: String::new(),
            values: values.into_iter().map(Into::into).collect(),
            or: Vec::new(),
        }
    }

    pub fn with_or(mut self, alternative: LogicField) -> Self {
        self.or.push(alternative);
        self
    }

    /// True when this row, ignoring its alternatives, can be rendered.
    pub fn is_complete(&self) -> bool {
        let Some(operator) = self.operator else {
            return false;
        };
        if self.name.trim().is_empty() {
            return false;
        }
        if operator.is_multi_value() {
            self.values.iter().any(|value| !value.trim().is_empty())
        } else if operator.takes_value() {
            !self.value.trim().is_empty()
        } else {
            true
        }
    }

    /// Iterates the row itself followed by its alternatives.
    pub fn alternatives(&self) -> impl Iterator<Item = &LogicField> {
        std::iter::once(self).chain(self.or.iter())
    }
}

fn operator_or_blank<'de, D>(deserializer: D) -> Result<Option<OperatorCode>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(code) => OperatorCode::from_code(code)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("unknown operator '{code}'"))),
    }
}
