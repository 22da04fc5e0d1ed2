use serde_json::json;

use crate::field::{Field, Step};

/// Default templates offered in the tool palette, in display order.
pub fn palette() -> Vec<Field> {
    vec![
        Field::new("text").with_kind("text").with_label("Text"),
        Field::new("number")
            .with_kind("text")
            .with_prop("inputType", "number")
            .with_prop("rules", json!(["nullable", "numeric"]))
            .with_prop("autocomplete", "off")
            .with_label("Number"),
        Field::new("email")
            .with_kind("text")
            .with_prop("inputType", "email")
            .with_prop("rules", json!(["nullable", "email"]))
            .with_label("Email"),
        Field::new("phone")
            .with_kind("phone")
            .with_label("Phone")
            .with_prop("allowIncomplete", true)
            .with_prop("unmask", true),
        Field::new("password")
            .with_kind("text")
            .with_prop("inputType", "password")
            .with_label("Password"),
        Field::new("url")
            .with_kind("text")
            .with_prop("inputType", "url")
            .with_prop("rules", json!(["nullable", "url"]))
            .with_prop("placeholder", "eg. http(s)://domain.com")
            .with_prop("floating", false)
            .with_label("URL"),
        stepper("stepper"),
    ]
}

/// A stepper template of the given `type` with one empty step.
pub fn stepper(kind: &str) -> Field {
    let mut field = Field::new(kind).with_kind(kind).with_label("Steps");
    field.steps.push(Step::new("step_1", "Step 1"));
    field
}

/// The palette entry called `name`.
pub fn tool(name: &str) -> Option<Field> {
    palette().into_iter().find(|field| field.name == name)
}
