use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::field::Field;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreviewMode {
    /// Fields as the end user sees them; `if` stays for the renderer.
    #[default]
    Live,
    /// Every field shown; `if` is replaced with `hasCondition: true`.
    Editing,
}

/// Render list for `fields`, as plain JSON records.
pub fn preview(fields: &[Field], mode: PreviewMode) -> Result<Vec<Value>, serde_json::Error> {
    fields
        .iter()
        .map(|field| {
            let record = serde_json::to_value(field)?;
            Ok(match mode {
                PreviewMode::Live => record,
                PreviewMode::Editing => mark_conditions(record),
            })
        })
        .collect()
}

fn mark_conditions(record: Value) -> Value {
    let Value::Object(mut object) = record else {
        return record;
    };
    if object.remove("if").is_some() {
        object.insert("hasCondition".into(), Value::Bool(true));
    }
    if let Some(Value::Array(steps)) = object.get_mut("steps") {
        for step in steps.iter_mut() {
            if let Some(Value::Array(children)) = step.get_mut("children") {
                let marked = std::mem::take(children)
                    .into_iter()
                    .map(mark_conditions)
                    .collect();
                *children = marked;
            }
        }
    }
    Value::Object(object)
}

