use std::collections::BTreeSet;

use form_logic::lexer::NAME_DELIMITERS;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::TreeError;
use crate::field::Field;

static NUMERIC_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_\d+$").expect("suffix pattern is valid"));

/// The set of names already taken in a scope.
#[derive(Debug, Clone, Default)]
pub struct NameRegistry {
    names: BTreeSet<String>,
}

impl NameRegistry {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_fields<'a>(fields: impl IntoIterator<Item = &'a Field>) -> Self {
        Self::new(fields.into_iter().map(|field| field.name.as_str()))
    }

    pub fn name_exists(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// `base` when free, otherwise the lowest free `base_N`.
    ///
    /// Probes `len() + 1` suffixes, which always contains a free one.
    pub fn generate_unique_name(&self, base: &str) -> String {
        if !self.name_exists(base) {
            return base.to_string();
        }
        (1..=self.names.len() + 1)
            .map(|counter| format!("{base}_{counter}"))
            .find(|candidate| !self.name_exists(candidate))
            .unwrap_or_else(|| format!("{base}_{}", self.names.len() + 1))
    }

    /// Generates a unique name from `base` and marks it as taken.
    pub fn claim(&mut self, base: &str) -> String {
        let name = self.generate_unique_name(base);
        self.names.insert(name.clone());
        name
    }

    pub fn insert(&mut self, name: impl Into<String>) {
        self.names.insert(name.into());
    }

    pub fn remove(&mut self, name: &str) {
        self.names.remove(name);
    }

    /// Checks that `candidate` can replace `current`.
    pub fn validate_rename(&self, current: &str, candidate: &str) -> Result<(), TreeError> {
        validate_name(candidate)?;
        if candidate != current && self.name_exists(candidate) {
            return Err(TreeError::DuplicateName {
                name: candidate.to_string(),
            });
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// A field name is non-empty and has no whitespace or characters that end a
/// `$name` reference inside a condition.
pub fn validate_name(name: &str) -> Result<(), TreeError> {
    if name.trim().is_empty() {
        return Err(TreeError::EmptyName);
    }
    if name
        .chars()
        .any(|ch| ch.is_whitespace() || NAME_DELIMITERS.contains(&ch))
    {
        return Err(TreeError::InvalidName {
            name: name.to_string(),
        });
    }
    Ok(())
}

/// `email_2` -> `email`. Names without a numeric suffix come back unchanged.
pub fn strip_numeric_suffix(name: &str) -> &str {
    match NUMERIC_SUFFIX.find(name) {
        Some(suffix) if suffix.start() > 0 => &name[..suffix.start()],
        _ => name,
    }
}
