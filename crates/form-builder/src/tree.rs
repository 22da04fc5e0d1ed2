use std::collections::BTreeMap;

use form_logic::{LogicField, LogicTarget, compile_for, decompile};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::EditorConfig;
use crate::error::TreeError;
use crate::field::{Field, Step, Viewport};
use crate::registry::{NameRegistry, strip_numeric_suffix, validate_name};

/// Transient editor state that is never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub active_field: Option<String>,
    pub active_step: Option<String>,
    pub viewport: Viewport,
}

/// Addresses a field either by position in the current scope or by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRef<'a> {
    Index(usize),
    Name(&'a str),
}

impl From<usize> for FieldRef<'_> {
    fn from(index: usize) -> Self {
        FieldRef::Index(index)
    }
}

impl<'a> From<&'a str> for FieldRef<'a> {
    fn from(name: &'a str) -> Self {
        FieldRef::Name(name)
    }
}

/// Optional edits applied by [`FieldTree::update_step`]. An empty
/// `prev_label`/`next_label` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepPatch {
    pub label: Option<String>,
    pub show_previous: Option<bool>,
    pub prev_label: Option<String>,
    pub next_label: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Location {
    Root(usize),
    Step { step: usize, index: usize },
}

impl Location {
    fn index(self) -> usize {
        match self {
            Location::Root(index) | Location::Step { index, .. } => index,
        }
    }
}

/// The form layout being edited.
///
/// Without a stepper the layout is a flat list of fields. With one, the stepper
/// is the only root entry and every other field lives in one of its steps.
/// Names are unique across the whole tree either way.
#[derive(Debug, Clone)]
pub struct FieldTree {
    fields: Vec<Field>,
    selection: Selection,
    stepper_type: String,
    grid_columns: u8,
}

impl Default for FieldTree {
    fn default() -> Self {
        Self::with_config(&EditorConfig::default())
    }
}

impl FieldTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: &EditorConfig) -> Self {
        Self {
            fields: Vec::new(),
            selection: Selection {
                viewport: config.default_viewport,
                ..Selection::default()
            },
            stepper_type: config.stepper_type.clone(),
            grid_columns: config.grid_columns,
        }
    }

    pub fn from_snapshot(fields: Vec<Field>) -> Self {
        Self::from_snapshot_with(fields, &EditorConfig::default())
    }

    pub fn from_snapshot_with(fields: Vec<Field>, config: &EditorConfig) -> Self {
        let mut tree = Self::with_config(config);
        tree.restore(fields);
        tree
    }

    /// Deep copy of the persisted layout.
    pub fn snapshot(&self) -> Vec<Field> {
        self.fields.clone()
    }

    /// Replaces the layout, keeping the selection where it still resolves.
    pub fn restore(&mut self, mut fields: Vec<Field>) {
        for_each_field(&mut fields, &mut |field| {
            if let Some(columns) = field.columns.as_mut() {
                columns.normalize();
            }
        });
        self.fields = fields;
        if let Some(active) = self.selection.active_field.clone()
            && self.field(&active).is_none()
        {
            self.selection.active_field = None;
        }
        if let Some(step) = self.selection.active_step.clone()
            && !self.steps().iter().any(|candidate| candidate.name == step)
        {
            self.selection.active_step = None;
        }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn stepper_type(&self) -> &str {
        &self.stepper_type
    }

    pub fn grid_columns(&self) -> u8 {
        self.grid_columns
    }

    /// Every field, including the stepper and the children of every step.
    pub fn all_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().flat_map(|field| {
            std::iter::once(field).chain(field.steps.iter().flat_map(|step| step.children.iter()))
        })
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.all_fields().find(|field| field.name == name)
    }

    pub fn active_field(&self) -> Option<&Field> {
        self.selection
            .active_field
            .as_deref()
            .and_then(|name| self.field(name))
    }

    pub fn names(&self) -> NameRegistry {
        NameRegistry::from_fields(self.all_fields())
    }

    pub fn stepper(&self) -> Option<&Field> {
        self.stepper_index().map(|index| &self.fields[index])
    }

    pub fn has_stepper(&self) -> bool {
        self.stepper_index().is_some()
    }

    pub fn steps(&self) -> &[Step] {
        self.stepper()
            .map(|stepper| stepper.steps.as_slice())
            .unwrap_or_default()
    }

    /// The step operations target; the first step when none is selected.
    pub fn active_step(&self) -> Option<&Step> {
        self.active_step_index().map(|index| &self.steps()[index])
    }

    /// Fields addressed by index-based operations: the root list, or the
    /// active step's children when a stepper exists.
    pub fn scope(&self) -> &[Field] {
        match self.active_step() {
            Some(step) => &step.children,
            None => &self.fields,
        }
    }

    pub fn set_active_field(&mut self, name: Option<&str>) -> bool {
        match name {
            Some(name) if self.field(name).is_none() => {
                debug!(name, "ignoring selection of unknown field");
                false
            }
            _ => {
                self.selection.active_field = name.map(str::to_string);
                true
            }
        }
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.selection.viewport = viewport;
    }

    pub fn set_active_step(&mut self, name: &str) -> Result<(), TreeError> {
        self.step_index(name)?;
        self.selection.active_step = Some(name.to_string());
        Ok(())
    }

    /// Inserts a copy of `template` at `pos` in the current scope and returns
    /// the name it was stored under.
    ///
    /// `None` appends; positions are clamped to the scope. A stepper template
    /// is rejected when the form already has one.
    pub fn add_field(&mut self, template: Field, pos: Option<isize>) -> Result<String, TreeError> {
        if template.is_stepper(&self.stepper_type) {
            return self.add_stepper(template);
        }

        let mut field = template;
        let base = if field.name.trim().is_empty() {
            field.kind.clone().unwrap_or_else(|| "field".to_string())
        } else {
            field.name.clone()
        };
        validate_name(&base)?;
        field.name = self.names().generate_unique_name(&base);
        let name = field.name.clone();

        let location = self.scope_location(0);
        let Some(scope) = self.container_mut(location) else {
            return Err(TreeError::NoStepper);
        };
        let index = match pos {
            None => scope.len(),
            Some(pos) => usize::try_from(pos).unwrap_or(0).min(scope.len()),
        };
        scope.insert(index, field);
        debug!(%name, index, "added field");
        Ok(name)
    }

    fn add_stepper(&mut self, template: Field) -> Result<String, TreeError> {
        if let Some(existing) = self.stepper() {
            warn!(existing = %existing.name, "rejecting second stepper");
            return Err(TreeError::StepperExists);
        }

        let mut stepper = template;
        let mut names = self.names();
        let base = if stepper.name.trim().is_empty() {
            self.stepper_type.clone()
        } else {
            stepper.name.clone()
        };
        validate_name(&base)?;
        stepper.name = names.claim(&base);
        if stepper.steps.is_empty() {
            stepper.steps.push(Step::new("step_1", "Step 1"));
        }
        for step in &mut stepper.steps {
            for child in &mut step.children {
                child.name = names.claim(&child.name);
            }
        }

        let root = std::mem::take(&mut self.fields);
        let moved = root.len();
        let first = &mut stepper.steps[0];
        first.children.splice(0..0, root);
        self.selection.active_step = Some(first.name.clone());

        let name = stepper.name.clone();
        self.fields = vec![stepper];
        debug!(%name, moved, "added stepper");
        Ok(name)
    }

    /// Removes a field and scrubs conditions in other fields that reference
    /// it. `index` is a hint into the current scope; the field is otherwise
    /// looked up by name anywhere in the tree.
    ///
    /// Returns `None` when no such field exists. Removing the stepper hands its
    /// children back to the root list.
    pub fn remove_field(&mut self, name: &str, index: Option<usize>) -> Option<Field> {
        if self.stepper().is_some_and(|stepper| stepper.name == name) {
            return self.remove_stepper().ok();
        }

        let hinted = index
            .filter(|&index| self.scope().get(index).is_some_and(|field| field.name == name))
            .map(|index| self.scope_location(index));
        let Some(location) = hinted.or_else(|| self.locate(name)) else {
            debug!(name, ?index, "remove ignored: field not found");
            return None;
        };

        let removed = self.take(location)?;
        let scrubbed = self.scrub_references(&[removed.name.as_str()]);
        if self.selection.active_field.as_deref() == Some(name) {
            self.selection.active_field = None;
        }
        debug!(name, scrubbed, "removed field");
        Some(removed)
    }

    /// Clones a field next to its source under a fresh name and selects the
    /// clone. Returns the clone's name, or `None` when the source is gone.
    pub fn copy_field<'a>(&mut self, target: impl Into<FieldRef<'a>>) -> Result<Option<String>, TreeError> {
        let location = match target.into() {
            FieldRef::Index(index) => (index < self.scope().len()).then(|| self.scope_location(index)),
            FieldRef::Name(name) => self.locate(name),
        };
        let Some(location) = location else {
            debug!("copy ignored: field not found");
            return Ok(None);
        };
        let Some(mut copy) = self.get(location).cloned() else {
            return Ok(None);
        };
        if copy.is_stepper(&self.stepper_type) {
            warn!(name = %copy.name, "rejecting stepper copy");
            return Err(TreeError::StepperExists);
        }

        let source = std::mem::take(&mut copy.name);
        copy.name = self.names().generate_unique_name(strip_numeric_suffix(&source));
        let name = copy.name.clone();
        if let Some(container) = self.container_mut(location) {
            container.insert(location.index() + 1, copy);
        }
        self.selection.active_field = Some(name.clone());
        debug!(%source, %name, "copied field");
        Ok(Some(name))
    }

    /// Moves `name` from `original` to `destination` within the current scope.
    /// Stale or out-of-range positions are ignored and return `false`.
    pub fn update_field_index(&mut self, name: &str, original: usize, destination: usize) -> bool {
        let location = self.scope_location(0);
        let Some(scope) = self.container_mut(location) else {
            return false;
        };
        let origin = if scope.get(original).is_some_and(|field| field.name == name) {
            original
        } else if let Some(found) = scope.iter().position(|field| field.name == name) {
            found
        } else {
            debug!(name, original, "reorder ignored: field not in scope");
            return false;
        };
        if destination >= scope.len() || origin == destination {
            debug!(name, origin, destination, "reorder ignored");
            return false;
        }
        let field = scope.remove(origin);
        scope.insert(destination, field);
        debug!(name, origin, destination, "moved field");
        true
    }

    /// Renames a field wherever it lives and rewrites references to it.
    pub fn rename_field(&mut self, old: &str, new: &str) -> Result<(), TreeError> {
        let Some(location) = self.locate(old) else {
            return Err(TreeError::FieldNotFound {
                name: old.to_string(),
            });
        };
        self.names().validate_rename(old, new)?;
        if old == new {
            return Ok(());
        }

        if let Some(field) = self.get_mut(location) {
            field.name = new.to_string();
        }
        let renames = BTreeMap::from([(old.to_string(), new.to_string())]);
        let mut rewritten = 0;
        for_each_field(&mut self.fields, &mut |field| {
            if field.remap_references(&renames) {
                rewritten += 1;
            }
        });
        if self.selection.active_field.as_deref() == Some(old) {
            self.selection.active_field = Some(new.to_string());
        }
        debug!(old, new, rewritten, "renamed field");
        Ok(())
    }

    /// Patches one property of the named field. `name` is routed through
    /// [`FieldTree::rename_field`]; falsy values remove the property.
    pub fn update_property(&mut self, name: &str, property: &str, value: Value) -> Result<(), TreeError> {
        let Some(location) = self.locate(name) else {
            return Err(TreeError::FieldNotFound {
                name: name.to_string(),
            });
        };

        match property {
            "name" => {
                let new: String =
                    serde_json::from_value(value).map_err(|source| TreeError::InvalidProperty {
                        property: property.to_string(),
                        source,
                    })?;
                return self.rename_field(name, &new);
            }
            "steps" => {
                return Err(TreeError::ReservedProperty {
                    property: property.to_string(),
                });
            }
            "type" => {
                let is_stepper = self
                    .get(location)
                    .is_some_and(|field| field.is_stepper(&self.stepper_type));
                if is_stepper || value.as_str() == Some(self.stepper_type.as_str()) {
                    return Err(TreeError::ReservedProperty {
                        property: property.to_string(),
                    });
                }
            }
            _ => {}
        }

        let Some(field) = self.get_mut(location) else {
            return Err(TreeError::FieldNotFound {
                name: name.to_string(),
            });
        };
        field.set_property(property, value)?;
        debug!(name, property, "updated property");
        Ok(())
    }

    pub fn update_prop_from_active_field(&mut self, property: &str, value: Value) -> Result<(), TreeError> {
        let name = self
            .selection
            .active_field
            .clone()
            .ok_or(TreeError::NoActiveField)?;
        self.update_property(&name, property, value)
    }

    /// Compiles `rows` and stores the result in the property `target` names.
    pub fn update_logic(&mut self, name: &str, target: LogicTarget, rows: &[LogicField]) -> Result<(), TreeError> {
        self.update_property(name, target.property(), compile_for(rows, target))
    }

    /// Editable rows for the condition stored under `target`; a single blank
    /// row when there is none.
    pub fn logic_rows(&self, name: &str, target: LogicTarget) -> Result<Vec<LogicField>, TreeError> {
        let field = self.field(name).ok_or_else(|| TreeError::FieldNotFound {
            name: name.to_string(),
        })?;
        let expression = match target {
            LogicTarget::Visibility => field.condition.as_deref(),
            LogicTarget::Validation => field.validation.as_ref().and_then(|validation| validation.condition()),
            LogicTarget::Disable => field.disable.as_ref().map(|disable| disable.condition.as_str()),
        };
        Ok(decompile(expression.unwrap_or_default())?)
    }

    pub fn add_step(&mut self, label: Option<&str>) -> Result<String, TreeError> {
        let stepper = self.stepper_mut()?;
        let number = stepper.steps.len() + 1;
        let name = NameRegistry::new(stepper.steps.iter().map(|step| step.name.as_str()))
            .generate_unique_name(&format!("step_{number}"));
        let label = label.map_or_else(|| format!("Step {number}"), str::to_string);
        stepper.steps.push(Step::new(name.clone(), label));
        self.selection.active_step = Some(name.clone());
        debug!(%name, "added step");
        Ok(name)
    }

    /// Inserts a deep copy of a step after it. Every cloned field gets a fresh
    /// name, and references between the cloned fields follow the new names.
    pub fn duplicate_step(&mut self, name: &str) -> Result<String, TreeError> {
        let index = self.step_index(name)?;
        let mut names = self.names();
        let stepper = self.stepper_mut()?;
        let mut copy = stepper.steps[index].clone();

        copy.name = NameRegistry::new(stepper.steps.iter().map(|step| step.name.as_str()))
            .generate_unique_name(&format!("step_{}", stepper.steps.len() + 1));
        let mut renames = BTreeMap::new();
        for child in &mut copy.children {
            let fresh = names.claim(strip_numeric_suffix(&child.name));
            renames.insert(std::mem::replace(&mut child.name, fresh.clone()), fresh);
        }
        for child in &mut copy.children {
            child.remap_references(&renames);
        }

        let copied = copy.name.clone();
        stepper.steps.insert(index + 1, copy);
        debug!(source = name, name = %copied, fields = renames.len(), "duplicated step");
        Ok(copied)
    }

    /// Removes a step with its fields. The last remaining step cannot be
    /// removed.
    pub fn remove_step(&mut self, name: &str) -> Result<Step, TreeError> {
        let index = self.step_index(name)?;
        let stepper = self.stepper_mut()?;
        if stepper.steps.len() == 1 {
            warn!(name, "refusing to remove the last step");
            return Err(TreeError::LastStep);
        }
        let removed = stepper.steps.remove(index);

        let gone = removed
            .children
            .iter()
            .map(|child| child.name.as_str())
            .collect::<Vec<_>>();
        let scrubbed = self.scrub_references(&gone);
        if self
            .selection
            .active_field
            .as_deref()
            .is_some_and(|active| gone.contains(&active))
        {
            self.selection.active_field = None;
        }
        if self.selection.active_step.as_deref() == Some(name) {
            self.selection.active_step = None;
        }
        debug!(name, fields = gone.len(), scrubbed, "removed step");
        Ok(removed)
    }

    pub fn rename_step(&mut self, name: &str, new_name: &str) -> Result<(), TreeError> {
        let index = self.step_index(name)?;
        let stepper = self.stepper_mut()?;
        NameRegistry::new(stepper.steps.iter().map(|step| step.name.as_str()))
            .validate_rename(name, new_name)?;
        stepper.steps[index].name = new_name.to_string();
        if self.selection.active_step.as_deref() == Some(name) {
            self.selection.active_step = Some(new_name.to_string());
        }
        debug!(name, new_name, "renamed step");
        Ok(())
    }

    pub fn update_step(&mut self, name: &str, patch: StepPatch) -> Result<(), TreeError> {
        let index = self.step_index(name)?;
        let step = &mut self.stepper_mut()?.steps[index];
        if let Some(label) = patch.label {
            step.label = label;
        }
        if let Some(show_previous) = patch.show_previous {
            step.show_previous = show_previous;
        }
        if let Some(prev_label) = patch.prev_label {
            step.prev_label = (!prev_label.is_empty()).then_some(prev_label);
        }
        if let Some(next_label) = patch.next_label {
            step.next_label = (!next_label.is_empty()).then_some(next_label);
        }
        debug!(name, "updated step");
        Ok(())
    }

    /// Disposes the stepper, moving every step's children back to the root
    /// list in step order. Returns the emptied stepper.
    pub fn remove_stepper(&mut self) -> Result<Field, TreeError> {
        let index = self.stepper_index().ok_or(TreeError::NoStepper)?;
        let mut stepper = self.fields.remove(index);
        let children = std::mem::take(&mut stepper.steps)
            .into_iter()
            .flat_map(|step| step.children)
            .collect::<Vec<_>>();
        let restored = children.len();
        self.fields.splice(index..index, children);
        self.selection.active_step = None;
        if self.selection.active_field.as_deref() == Some(stepper.name.as_str()) {
            self.selection.active_field = None;
        }
        debug!(name = %stepper.name, restored, "removed stepper");
        Ok(stepper)
    }

    /// Column span of the active field on the active viewport.
    pub fn active_field_columns(&self) -> u8 {
        self.active_field().map_or(self.grid_columns, |field| {
            field.span(self.selection.viewport, self.grid_columns)
        })
    }

    /// Sets the active field's span on the active viewport, clamped to the
    /// grid. Returns the stored span.
    pub fn update_active_field_columns(&mut self, span: u8) -> Result<u8, TreeError> {
        let name = self
            .selection
            .active_field
            .clone()
            .ok_or(TreeError::NoActiveField)?;
        let location = self
            .locate(&name)
            .ok_or_else(|| TreeError::FieldNotFound { name: name.clone() })?;
        let span = span.clamp(1, self.grid_columns);
        let viewport = self.selection.viewport;
        if let Some(field) = self.get_mut(location) {
            field.columns.get_or_insert_default().set(viewport, span);
        }
        debug!(%name, ?viewport, span, "updated columns");
        Ok(span)
    }

    fn stepper_index(&self) -> Option<usize> {
        self.fields
            .iter()
            .position(|field| field.is_stepper(&self.stepper_type))
    }

    fn stepper_mut(&mut self) -> Result<&mut Field, TreeError> {
        let index = self.stepper_index().ok_or(TreeError::NoStepper)?;
        Ok(&mut self.fields[index])
    }

    fn step_index(&self, name: &str) -> Result<usize, TreeError> {
        if !self.has_stepper() {
            return Err(TreeError::NoStepper);
        }
        self.steps()
            .iter()
            .position(|step| step.name == name)
            .ok_or_else(|| TreeError::StepNotFound {
                name: name.to_string(),
            })
    }

    fn active_step_index(&self) -> Option<usize> {
        let steps = self.steps();
        if steps.is_empty() {
            return None;
        }
        let selected = self
            .selection
            .active_step
            .as_deref()
            .and_then(|name| steps.iter().position(|step| step.name == name));
        Some(selected.unwrap_or(0))
    }

    fn scope_location(&self, index: usize) -> Location {
        match self.active_step_index() {
            Some(step) => Location::Step { step, index },
            None => Location::Root(index),
        }
    }

    fn locate(&self, name: &str) -> Option<Location> {
        if let Some(index) = self.fields.iter().position(|field| field.name == name) {
            return Some(Location::Root(index));
        }
        self.steps().iter().enumerate().find_map(|(step, candidate)| {
            candidate
                .children
                .iter()
                .position(|field| field.name == name)
                .map(|index| Location::Step { step, index })
        })
    }

    fn container_mut(&mut self, location: Location) -> Option<&mut Vec<Field>> {
        match location {
            Location::Root(_) => Some(&mut self.fields),
            Location::Step { step, .. } => {
                let stepper = self.stepper_index()?;
                self.fields[stepper]
                    .steps
                    .get_mut(step)
                    .map(|step| &mut step.children)
            }
        }
    }

    fn get(&self, location: Location) -> Option<&Field> {
        match location {
            Location::Root(index) => self.fields.get(index),
            Location::Step { step, index } => self.steps().get(step)?.children.get(index),
        }
    }

    fn get_mut(&mut self, location: Location) -> Option<&mut Field> {
        self.container_mut(location)?.get_mut(location.index())
    }

    fn take(&mut self, location: Location) -> Option<Field> {
        let container = self.container_mut(location)?;
        (location.index() < container.len()).then(|| container.remove(location.index()))
    }

    fn scrub_references(&mut self, names: &[&str]) -> usize {
        let mut scrubbed = 0;
        for_each_field(&mut self.fields, &mut |field| {
            for name in names {
                if field.prune_references(name) {
                    scrubbed += 1;
                }
            }
        });
        scrubbed
    }
}

fn for_each_field(fields: &mut [Field], visit: &mut impl FnMut(&mut Field)) {
    for field in fields {
        visit(field);
        for step in &mut field.steps {
            for_each_field(&mut step.children, visit);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_is_first_step_until_one_is_selected() {
        let mut tree = FieldTree::new();
        tree.add_field(Field::new("stepper").with_kind("stepper"), None)
            .expect("stepper");
        tree.add_step(None).expect("second step");
        tree.selection.active_step = None;
        assert_eq!(tree.active_step().map(|step| step.name.as_str()), Some("step_1"));
    }
}
