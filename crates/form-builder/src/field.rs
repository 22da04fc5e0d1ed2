use std::collections::BTreeMap;

use form_logic::{Pruned, prune_references, remap_references};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::TreeError;

/// Layout breakpoints a column span can be keyed by.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Viewport {
    #[default]
    Default,
    Sm,
    Lg,
}

impl Viewport {
    pub const ALL: [Viewport; 3] = [Viewport::Default, Viewport::Sm, Viewport::Lg];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Span {
    pub container: u8,
}

/// Per-viewport column span of a field.
///
/// A bare `container` is shorthand for the default viewport. Once any keyed
/// entry exists the shorthand is folded into `default`, so the two forms never
/// coexist after a write.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ColumnSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Span>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sm: Option<Span>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lg: Option<Span>,
}

impl ColumnSpec {
    pub fn entry(&self, viewport: Viewport) -> Option<u8> {
        let span = match viewport {
            Viewport::Default => self.default,
            Viewport::Sm => self.sm,
            Viewport::Lg => self.lg,
        };
        span.map(|span| span.container)
    }

    fn entry_mut(&mut self, viewport: Viewport) -> &mut Option<Span> {
        match viewport {
            Viewport::Default => &mut self.default,
            Viewport::Sm => &mut self.sm,
            Viewport::Lg => &mut self.lg,
        }
    }

    pub fn is_keyed(&self) -> bool {
        self.default.is_some() || self.sm.is_some() || self.lg.is_some()
    }

    /// Effective span for `viewport`, or `fallback` when nothing applies.
    pub fn span(&self, viewport: Viewport, fallback: u8) -> u8 {
        self.entry(viewport)
            .or(self.container)
            .unwrap_or(fallback)
    }

    /// Writes `span` for `viewport`.
    pub fn set(&mut self, viewport: Viewport, span: u8) {
        if viewport == Viewport::Default && !self.is_keyed() {
            self.container = Some(span);
            return;
        }
        if let Some(container) = self.container.take()
            && self.default.is_none()
        {
            self.default = Some(Span { container });
        }
        *self.entry_mut(viewport) = Some(Span { container: span });
    }

    /// Folds a legacy `container` into `default` when keyed entries exist.
    pub fn normalize(&mut self) {
        if !self.is_keyed() {
            return;
        }
        if let Some(container) = self.container.take()
            && self.default.is_none()
        {
            self.default = Some(Span { container });
        }
    }

    pub fn has_both_forms(&self) -> bool {
        self.container.is_some() && self.default.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.container.is_none() && !self.is_keyed()
    }
}

/// A property whose value depends on a condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Toggle<T> {
    #[serde(rename = "if")]
    pub condition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub then: Option<T>,
    #[serde(rename = "else", default, skip_serializing_if = "Option::is_none")]
    pub otherwise: Option<T>,
}

/// Pipe-separated validation rules, plain or behind a condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum Validation {
    Rules(String),
    Toggle(Toggle<String>),
}

impl Validation {
    /// The rule string that applies when the condition holds.
    pub fn rules(&self) -> Option<&str> {
        match self {
            Validation::Rules(rules) => Some(rules),
            Validation::Toggle(toggle) => toggle.then.as_deref(),
        }
    }

    pub fn condition(&self) -> Option<&str> {
        match self {
            Validation::Rules(_) => None,
            Validation::Toggle(toggle) => Some(&toggle.condition),
        }
    }
}

/// One page of a stepper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub show_previous: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_label: Option<String>,
    #[serde(default)]
    pub children: Vec<Field>,
}

impl Step {
    pub fn new(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            show_previous: false,
            prev_label: None,
            next_label: None,
            children: Vec::new(),
        }
    }
}

/// A single entry in the form layout.
///
/// Only `name` is required. Widget properties the builder does not model are
/// kept verbatim in `props`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<Align>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<ColumnSpec>,
    #[serde(rename = "if", default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<Validation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disable: Option<Toggle<bool>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<Step>,
    #[serde(flatten)]
    pub props: Map<String, Value>,
}

impl Field {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: None,
            label: None,
            align: None,
            columns: None,
            condition: None,
            validation: None,
            disable: None,
            steps: Vec::new(),
            props: Map::new(),
        }
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_prop(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.props.insert(key.into(), value.into());
        self
    }

    pub fn with_condition(mut self, expression: impl Into<String>) -> Self {
        self.condition = Some(expression.into());
        self
    }

    pub fn with_columns(mut self, columns: ColumnSpec) -> Self {
        self.columns = Some(columns);
        self
    }

    pub fn is_stepper(&self, stepper_type: &str) -> bool {
        self.kind.as_deref() == Some(stepper_type)
    }

    /// Column span this field occupies on `viewport` in a `grid`-column layout.
    pub fn span(&self, viewport: Viewport, grid: u8) -> u8 {
        self.columns
            .as_ref()
            .map_or(grid, |columns| columns.span(viewport, grid))
    }

    /// Every stored condition as `(property, expression)`.
    pub fn conditions(&self) -> Vec<(&'static str, &str)> {
        let mut found = Vec::new();
        if let Some(condition) = &self.condition {
            found.push(("if", condition.as_str()));
        }
        if let Some(condition) = self.validation.as_ref().and_then(Validation::condition) {
            found.push(("validation", condition));
        }
        if let Some(disable) = &self.disable {
            found.push(("disable", disable.condition.as_str()));
        }
        found
    }

    /// Reads a property back in its persisted JSON form.
    pub fn property(&self, property: &str) -> Option<Value> {
        self.to_object(property)
            .ok()
            .and_then(|mut object| object.remove(property))
    }

    /// Writes `value` under `property`.
    ///
    /// `validation` and `disable` patches are merged with the toggle already
    /// stored. After the write settles, a `false`, `""`, `null` or structurally
    /// empty value removes the property instead.
    pub fn set_property(&mut self, property: &str, value: Value) -> Result<(), TreeError> {
        let value = match property {
            "validation" => merge_validation(self.validation.as_ref(), value),
            "disable" => merge_disable(value),
            _ => value,
        };

        let mut object = self.to_object(property)?;
        object.insert(property.to_string(), value);
        let mut written = Self::from_object(property, object)?;
        if let Some(columns) = written.columns.as_mut() {
            columns.normalize();
        }

        let mut settled = written.to_object(property)?;
        if settled.get(property).is_some_and(is_falsy) {
            settled.remove(property);
            written = Self::from_object(property, settled)?;
        }
        *self = written;
        Ok(())
    }

    /// Drops the conditions that reference `name`. Returns whether anything
    /// changed.
    pub fn prune_references(&mut self, name: &str) -> bool {
        let mut changed = false;

        if let Some(condition) = &self.condition {
            match prune_references(condition, name) {
                Pruned::Untouched => {}
                Pruned::Rewritten(rest) => {
                    self.condition = Some(rest);
                    changed = true;
                }
                Pruned::Emptied => {
                    self.condition = None;
                    changed = true;
                }
            }
        }

        if let Some(Validation::Toggle(toggle)) = &mut self.validation {
            match prune_references(&toggle.condition, name) {
                Pruned::Untouched => {}
                Pruned::Rewritten(rest) => {
                    toggle.condition = rest;
                    changed = true;
                }
                Pruned::Emptied => {
                    self.validation = toggle
                        .then
                        .take()
                        .filter(|rules| !rules.is_empty())
                        .map(Validation::Rules);
                    changed = true;
                }
            }
        }

        if let Some(disable) = &mut self.disable {
            match prune_references(&disable.condition, name) {
                Pruned::Untouched => {}
                Pruned::Rewritten(rest) => {
                    disable.condition = rest;
                    changed = true;
                }
                Pruned::Emptied => {
                    self.disable = None;
                    changed = true;
                }
            }
        }

        changed
    }

    /// Rewrites references according to `renames`. Returns whether anything
    /// changed.
    pub fn remap_references(&mut self, renames: &BTreeMap<String, String>) -> bool {
        let mut changed = false;
        let mut apply = |expression: &mut String| {
            if let Some(rewritten) = remap_references(expression, renames) {
                *expression = rewritten;
                changed = true;
            }
        };
        if let Some(condition) = self.condition.as_mut() {
            apply(condition);
        }
        if let Some(Validation::Toggle(toggle)) = self.validation.as_mut() {
            apply(&mut toggle.condition);
        }
        if let Some(disable) = self.disable.as_mut() {
            apply(&mut disable.condition);
        }
        changed
    }

    fn to_object(&self, property: &str) -> Result<Map<String, Value>, TreeError> {
        match serde_json::to_value(self) {
            Ok(Value::Object(object)) => Ok(object),
            Ok(_) => Ok(Map::new()),
            Err(source) => Err(TreeError::InvalidProperty {
                property: property.to_string(),
                source,
            }),
        }
    }

    fn from_object(property: &str, object: Map<String, Value>) -> Result<Self, TreeError> {
        serde_json::from_value(Value::Object(object)).map_err(|source| TreeError::InvalidProperty {
            property: property.to_string(),
            source,
        })
    }
}

/// `null`, `false`, `""`, or an object made only of such values.
pub fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => true,
        Value::String(text) => text.is_empty(),
        Value::Object(object) => object.values().all(is_falsy),
        _ => false,
    }
}

fn merge_validation(current: Option<&Validation>, value: Value) -> Value {
    match value {
        Value::String(rules) => match current {
            Some(Validation::Toggle(toggle)) => toggle_value(
                toggle.condition.clone(),
                (!rules.is_empty()).then_some(rules),
                toggle.otherwise.clone(),
            ),
            _ => Value::String(rules),
        },
        Value::Object(mut patch) => {
            let condition = take_string(&mut patch, "if").unwrap_or_default();
            let then = take_string(&mut patch, "then").or_else(|| {
                current
                    .and_then(Validation::rules)
                    .map(str::to_string)
            });
            let otherwise = take_string(&mut patch, "else").or_else(|| match current {
                Some(Validation::Toggle(toggle)) => toggle.otherwise.clone(),
                _ => None,
            });
            if condition.is_empty() {
                return then.map_or(Value::Null, Value::String);
            }
            toggle_value(condition, then, otherwise)
        }
        other => other,
    }
}

fn merge_disable(value: Value) -> Value {
    let Value::Object(mut patch) = value else {
        return value;
    };
    let condition = take_string(&mut patch, "if").unwrap_or_default();
    if condition.is_empty() {
        return Value::Null;
    }
    let mut object = Map::new();
    object.insert("if".into(), Value::String(condition));
    object.insert("then".into(), patch.remove("then").unwrap_or(Value::Bool(true)));
    object.insert("else".into(), patch.remove("else").unwrap_or(Value::Bool(false)));
    Value::Object(object)
}

fn toggle_value(condition: String, then: Option<String>, otherwise: Option<String>) -> Value {
    let mut object = Map::new();
    object.insert("if".into(), Value::String(condition));
    if let Some(then) = then {
        object.insert("then".into(), Value::String(then));
    }
    if let Some(otherwise) = otherwise {
        object.insert("else".into(), Value::String(otherwise));
    }
    Value::Object(object)
}

fn take_string(object: &mut Map<String, Value>, key: &str) -> Option<String> {
    match object.remove(key) {
        Some(Value::String(text)) => Some(text),
        _ => None,
    }
}
