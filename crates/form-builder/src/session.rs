use form_logic::{LogicField, LogicTarget};
use serde_json::Value;
use tracing::debug;

use crate::config::EditorConfig;
use crate::error::TreeError;
use crate::field::{Field, Step, Viewport};
use crate::history::HistoryLedger;
use crate::tree::{FieldRef, FieldTree, StepPatch};

/// What a successful editing operation changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    FieldAdded { name: String },
    FieldRemoved { name: String },
    FieldCopied { source: String, name: String },
    FieldMoved { name: String, from: usize, to: usize },
    FieldRenamed { from: String, to: String },
    PropertyUpdated { name: String, property: String },
    ColumnsUpdated { name: String, span: u8 },
    StepsChanged,
    StepperRemoved,
    SelectionChanged,
    Restored,
}

type Listener = Box<dyn FnMut(&Change, &FieldTree)>;

/// One editor instance: the field tree, its undo history and change
/// listeners.
///
/// Every mutation that succeeds records a snapshot and notifies listeners.
/// Rejected and ignored operations do neither.
pub struct EditorSession {
    tree: FieldTree,
    history: HistoryLedger<Vec<Field>>,
    config: EditorConfig,
    listeners: Vec<Listener>,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl std::fmt::Debug for EditorSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorSession")
            .field("tree", &self.tree)
            .field("history", &self.history)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl EditorSession {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            tree: FieldTree::with_config(&config),
            history: HistoryLedger::new().with_limit(config.history_limit),
            config,
            listeners: Vec::new(),
        }
    }

    /// Opens an existing layout. Undo stops at the layout as opened.
    pub fn open(fields: Vec<Field>, config: EditorConfig) -> Self {
        let tree = FieldTree::from_snapshot_with(fields, &config);
        Self {
            history: HistoryLedger::with_initial(tree.snapshot()).with_limit(config.history_limit),
            tree,
            config,
            listeners: Vec::new(),
        }
    }

    pub fn tree(&self) -> &FieldTree {
        &self.tree
    }

    pub fn history(&self) -> &HistoryLedger<Vec<Field>> {
        &self.history
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&Change, &FieldTree) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    fn commit(&mut self, change: Change) {
        self.history.record(self.tree.snapshot());
        self.notify(change);
    }

    fn notify(&mut self, change: Change) {
        debug!(?change, "editor change");
        for listener in &mut self.listeners {
            listener(&change, &self.tree);
        }
    }

    pub fn add_field(&mut self, template: Field, pos: Option<isize>) -> Result<String, TreeError> {
        let name = self.tree.add_field(template, pos)?;
        self.commit(Change::FieldAdded { name: name.clone() });
        Ok(name)
    }

    pub fn remove_field(&mut self, name: &str, index: Option<usize>) -> Option<Field> {
        let removed = self.tree.remove_field(name, index)?;
        self.commit(Change::FieldRemoved {
            name: removed.name.clone(),
        });
        Some(removed)
    }

    pub fn copy_field<'a>(&mut self, target: impl Into<FieldRef<'a>>) -> Result<Option<String>, TreeError> {
        let target = target.into();
        let source = match target {
            FieldRef::Index(index) => self.tree.scope().get(index).map(|field| field.name.clone()),
            FieldRef::Name(name) => Some(name.to_string()),
        };
        let Some(name) = self.tree.copy_field(target)? else {
            return Ok(None);
        };
        self.commit(Change::FieldCopied {
            source: source.unwrap_or_default(),
            name: name.clone(),
        });
        Ok(Some(name))
    }

    pub fn update_field_index(&mut self, name: &str, original: usize, destination: usize) -> bool {
        if !self.tree.update_field_index(name, original, destination) {
            return false;
        }
        self.commit(Change::FieldMoved {
            name: name.to_string(),
            from: original,
            to: destination,
        });
        true
    }

    pub fn rename_field(&mut self, old: &str, new: &str) -> Result<(), TreeError> {
        self.tree.rename_field(old, new)?;
        if old != new {
            self.commit(Change::FieldRenamed {
                from: old.to_string(),
                to: new.to_string(),
            });
        }
        Ok(())
    }

    pub fn update_property(&mut self, name: &str, property: &str, value: Value) -> Result<(), TreeError> {
        if property == "name" {
            let new = value.as_str().unwrap_or_default().to_string();
            self.tree.update_property(name, property, value)?;
            if new != name {
                self.commit(Change::FieldRenamed {
                    from: name.to_string(),
                    to: new,
                });
            }
            return Ok(());
        }
        self.tree.update_property(name, property, value)?;
        self.commit(Change::PropertyUpdated {
            name: name.to_string(),
            property: property.to_string(),
        });
        Ok(())
    }

    pub fn update_prop_from_active_field(&mut self, property: &str, value: Value) -> Result<(), TreeError> {
        let name = self
            .tree
            .selection()
            .active_field
            .clone()
            .ok_or(TreeError::NoActiveField)?;
        self.update_property(&name, property, value)
    }

    pub fn update_logic(&mut self, name: &str, target: LogicTarget, rows: &[LogicField]) -> Result<(), TreeError> {
        self.tree.update_logic(name, target, rows)?;
        self.commit(Change::PropertyUpdated {
            name: name.to_string(),
            property: target.property().to_string(),
        });
        Ok(())
    }

    pub fn logic_rows(&self, name: &str, target: LogicTarget) -> Result<Vec<LogicField>, TreeError> {
        self.tree.logic_rows(name, target)
    }

    pub fn add_step(&mut self, label: Option<&str>) -> Result<String, TreeError> {
        let name = self.tree.add_step(label)?;
        self.commit(Change::StepsChanged);
        Ok(name)
    }

    pub fn duplicate_step(&mut self, name: &str) -> Result<String, TreeError> {
        let copied = self.tree.duplicate_step(name)?;
        self.commit(Change::StepsChanged);
        Ok(copied)
    }

    pub fn remove_step(&mut self, name: &str) -> Result<Step, TreeError> {
        let removed = self.tree.remove_step(name)?;
        self.commit(Change::StepsChanged);
        Ok(removed)
    }

    pub fn rename_step(&mut self, name: &str, new_name: &str) -> Result<(), TreeError> {
        self.tree.rename_step(name, new_name)?;
        self.commit(Change::StepsChanged);
        Ok(())
    }

    pub fn update_step(&mut self, name: &str, patch: StepPatch) -> Result<(), TreeError> {
        self.tree.update_step(name, patch)?;
        self.commit(Change::StepsChanged);
        Ok(())
    }

    pub fn remove_stepper(&mut self) -> Result<Field, TreeError> {
        let stepper = self.tree.remove_stepper()?;
        self.commit(Change::StepperRemoved);
        Ok(stepper)
    }

    pub fn active_field_columns(&self) -> u8 {
        self.tree.active_field_columns()
    }

    pub fn update_active_field_columns(&mut self, span: u8) -> Result<u8, TreeError> {
        let stored = self.tree.update_active_field_columns(span)?;
        let name = self.tree.selection().active_field.clone().unwrap_or_default();
        self.commit(Change::ColumnsUpdated { name, span: stored });
        Ok(stored)
    }

    pub fn set_active_field(&mut self, name: Option<&str>) -> bool {
        let changed = self.tree.set_active_field(name);
        if changed {
            self.notify(Change::SelectionChanged);
        }
        changed
    }

    pub fn set_active_step(&mut self, name: &str) -> Result<(), TreeError> {
        self.tree.set_active_step(name)?;
        self.notify(Change::SelectionChanged);
        Ok(())
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.tree.set_viewport(viewport);
        self.notify(Change::SelectionChanged);
    }

    /// Restores the previous snapshot. Returns `false` when there is nothing
    /// to go back to.
    pub fn undo(&mut self) -> bool {
        if self.history.is_back_disabled() {
            return false;
        }
        let Some(snapshot) = self.history.back() else {
            return false;
        };
        self.tree.restore(snapshot);
        self.notify(Change::Restored);
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(snapshot) = self.history.forward() else {
            return false;
        };
        self.tree.restore(snapshot);
        self.notify(Change::Restored);
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.history.is_back_disabled()
    }

    pub fn can_redo(&self) -> bool {
        !self.history.is_forward_disabled()
    }
}
