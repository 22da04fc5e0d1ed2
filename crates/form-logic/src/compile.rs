use serde_json::{Value, json};

use crate::field::LogicField;
use crate::lexer::quote_if_needed;
use crate::operator::OperatorCode;

/// Property a compiled expression is written into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicTarget {
    /// `if`: stored as the raw expression string.
    Visibility,
    /// `validation`: stored as `{ "if": expr }`.
    Validation,
    /// `disable`: stored as `{ "if": expr, "then": true, "else": false }`.
    Disable,
}

impl LogicTarget {
    pub fn property(self) -> &'static str {
        match self {
            LogicTarget::Visibility => "if",
            LogicTarget::Validation => "validation",
            LogicTarget::Disable => "disable",
        }
    }

    pub fn from_property(property: &str) -> Option<Self> {
        match property {
            "if" => Some(LogicTarget::Visibility),
            "validation" => Some(LogicTarget::Validation),
            "disable" => Some(LogicTarget::Disable),
            _ => None,
        }
    }

    /// Wraps a compiled expression in the shape stored under [`Self::property`].
    pub fn wrap(self, expression: String) -> Value {
        match self {
            LogicTarget::Visibility => Value::String(expression),
            LogicTarget::Validation => json!({ "if": expression }),
            LogicTarget::Disable => json!({ "if": expression, "then": true, "else": false }),
        }
    }
}

/// Compiles condition rows into an expression string.
///
/// Incomplete rows are skipped. Each top-level row is joined with its
/// alternatives by ` || `, and the resulting clauses by ` && `. Returns an
/// empty string when nothing is renderable.
pub fn compile(conditions: &[LogicField]) -> String {
    conditions
        .iter()
        .filter_map(render_clause)
        .collect::<Vec<_>>()
        .join(" && ")
}

/// Compiles and wraps in one step.
pub fn compile_for(conditions: &[LogicField], target: LogicTarget) -> Value {
    target.wrap(compile(conditions))
}

fn render_clause(condition: &LogicField) -> Option<String> {
    let terms = condition
        .alternatives()
        .filter_map(render_term)
        .collect::<Vec<_>>();
    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" || "))
    }
}

fn render_term(condition: &LogicField) -> Option<String> {
    if !condition.is_complete() {
        return None;
    }
    let operator = condition.operator?;
    let name = condition.name.trim();
    let term = match operator {
        OperatorCode::Empty | OperatorCode::NotEmpty => format!("{}(${name})", operator.token()),
        OperatorCode::Contains => format!(
            "{}(${name},{})",
            operator.token(),
            quote_if_needed(&condition.value)
        ),
        OperatorCode::Equals | OperatorCode::NotEquals => condition
            .values
            .iter()
            .filter(|value| !value.trim().is_empty())
            .map(|value| format!("${name} {} {}", operator.token(), quote_if_needed(value)))
            .collect::<Vec<_>>()
            .join(" || "),
        OperatorCode::GreaterThan
        | OperatorCode::GreaterOrEqualsThan
        | OperatorCode::LessThan
        | OperatorCode::LessOrEqualsThan => format!(
            "${name} {} {}",
            operator.token(),
            quote_if_needed(&condition.value)
        ),
    };
    Some(term)
}
