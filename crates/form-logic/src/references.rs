use std::collections::{BTreeMap, BTreeSet};

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::debug;

use crate::compile::compile;
use crate::decompile::parse;
use crate::error::LogicError;
use crate::field::LogicField;

/// Result of removing a field's references from an expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pruned {
    /// The expression never mentioned the field.
    Untouched,
    /// Some conditions survived; this is the recompiled expression.
    Rewritten(String),
    /// Every condition referenced the field; the expression is now empty.
    Emptied,
}

/// Field names referenced anywhere in `expression`.
pub fn references(expression: &str) -> Result<BTreeSet<String>, LogicError> {
    let fields = parse(expression)?;
    Ok(fields
        .iter()
        .flat_map(LogicField::alternatives)
        .map(|field| field.name.clone())
        .collect())
}

/// True when `expression` contains `$name` as a whole token.
///
/// Works on strings the parser rejects, so callers can still detect
/// references in hand-edited expressions.
pub fn mentions(expression: &str, name: &str) -> bool {
    token_pattern(name).is_some_and(|pattern| pattern.is_match(expression))
}

/// Drops every condition that references `name`.
///
/// An alternative that references the field is removed from its group; when a
/// group's primary condition goes, its first surviving alternative takes its
/// place. Unparseable expressions that mention the field are emptied whole.
pub fn prune_references(expression: &str, name: &str) -> Pruned {
    let fields = match parse(expression) {
        Ok(fields) => fields,
        Err(err) => {
            debug!(%err, name, "pruning unparseable expression by token match");
            return if mentions(expression, name) {
                Pruned::Emptied
            } else {
                Pruned::Untouched
            };
        }
    };

    let mut changed = false;
    let mut kept = Vec::new();
    for field in fields {
        let mut survivors = field
            .alternatives()
            .filter(|alt| alt.name != name)
            .map(|alt| LogicField {
                or: Vec::new(),
                ..alt.clone()
            })
            .collect::<Vec<_>>();
        if survivors.len() != field.or.len() + 1 {
            changed = true;
        }
        if survivors.is_empty() {
            continue;
        }
        let mut primary = survivors.remove(0);
        primary.or = survivors;
        kept.push(primary);
    }

    if !changed {
        Pruned::Untouched
    } else if kept.is_empty() {
        Pruned::Emptied
    } else {
        Pruned::Rewritten(compile(&kept))
    }
}

/// Rewrites `$from` references to `$to`. Returns `None` when nothing changed.
pub fn rename_references(expression: &str, from: &str, to: &str) -> Option<String> {
    let renames = BTreeMap::from([(from.to_string(), to.to_string())]);
    remap_references(expression, &renames)
}

/// Applies every rename in `renames` at once, so `a -> b` and `b -> c` do not
/// chain. Returns `None` when nothing changed.
pub fn remap_references(expression: &str, renames: &BTreeMap<String, String>) -> Option<String> {
    match parse(expression) {
        Ok(mut fields) => {
            let mut changed = false;
            for field in &mut fields {
                if let Some(to) = renames.get(&field.name) {
                    field.name = to.clone();
                    changed = true;
                }
                for alt in &mut field.or {
                    if let Some(to) = renames.get(&alt.name) {
                        alt.name = to.clone();
                        changed = true;
                    }
                }
            }
            changed.then(|| compile(&fields))
        }
        Err(_) => {
            let mut changed = false;
            let rewritten = VAR_TOKEN.replace_all(expression, |caps: &Captures<'_>| {
                match renames.get(&caps["name"]) {
                    Some(to) => {
                        changed = true;
                        format!("${to}")
                    }
                    None => caps[0].to_string(),
                }
            });
            changed.then(|| rewritten.into_owned())
        }
    }
}

static VAR_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\$(?P<name>[^\s(),$"]+)"#).expect("field reference pattern is valid")
});

fn token_pattern(name: &str) -> Option<Regex> {
    if name.is_empty() {
        return None;
    }
    Regex::new(&format!(r#"\${}(?P<tail>[\s(),"]|$)"#, regex::escape(name))).ok()
}
