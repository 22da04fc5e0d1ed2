use std::collections::BTreeSet;

use form_logic::references;
use serde::Serialize;

use crate::field::Field;
use crate::registry::validate_name;

/// A structural problem found in a stored layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Issue {
    DuplicateName { name: String },
    InvalidName { name: String },
    MultipleSteppers { count: usize },
    FieldOutsideStepper { name: String },
    EmptySteps { stepper: String },
    DanglingReference { field: String, property: String, reference: String },
    UnparseableCondition { field: String, property: String, error: String },
    DualColumnForms { field: String },
}

impl std::fmt::Display for Issue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Issue::DuplicateName { name } => write!(f, "duplicate field name '{name}'"),
            Issue::InvalidName { name } => write!(f, "invalid field name '{name}'"),
            Issue::MultipleSteppers { count } => write!(f, "{count} steppers found, at most one allowed"),
            Issue::FieldOutsideStepper { name } => {
                write!(f, "field '{name}' sits beside the stepper instead of inside a step")
            }
            Issue::EmptySteps { stepper } => write!(f, "stepper '{stepper}' has no steps"),
            Issue::DanglingReference {
                field,
                property,
                reference,
            } => write!(f, "{field}.{property} references unknown field '{reference}'"),
            Issue::UnparseableCondition { field, property, error } => {
                write!(f, "{field}.{property} cannot be parsed: {error}")
            }
            Issue::DualColumnForms { field } => {
                write!(f, "field '{field}' has both columns.container and columns.default")
            }
        }
    }
}

/// Reports every issue in `fields`, in document order.
pub fn check(fields: &[Field], stepper_type: &str) -> Vec<Issue> {
    let mut issues = Vec::new();

    let steppers = fields
        .iter()
        .filter(|field| field.is_stepper(stepper_type))
        .collect::<Vec<_>>();
    if steppers.len() > 1 {
        issues.push(Issue::MultipleSteppers {
            count: steppers.len(),
        });
    }
    if !steppers.is_empty() {
        for field in fields.iter().filter(|field| !field.is_stepper(stepper_type)) {
            issues.push(Issue::FieldOutsideStepper {
                name: field.name.clone(),
            });
        }
    }
    for stepper in &steppers {
        if stepper.steps.is_empty() {
            issues.push(Issue::EmptySteps {
                stepper: stepper.name.clone(),
            });
        }
    }

    let all = fields
        .iter()
        .flat_map(|field| {
            std::iter::once(field).chain(field.steps.iter().flat_map(|step| step.children.iter()))
        })
        .collect::<Vec<_>>();

    let mut seen = BTreeSet::new();
    let mut reported = BTreeSet::new();
    for field in &all {
        if validate_name(&field.name).is_err() {
            issues.push(Issue::InvalidName {
                name: field.name.clone(),
            });
        }
        if !seen.insert(field.name.as_str()) && reported.insert(field.name.as_str()) {
            issues.push(Issue::DuplicateName {
                name: field.name.clone(),
            });
        }
    }

    for field in &all {
        for (property, expression) in field.conditions() {
            match references(expression) {
                Ok(names) => {
                    for reference in names.into_iter().filter(|name| !seen.contains(name.as_str())) {
                        issues.push(Issue::DanglingReference {
                            field: field.name.clone(),
                            property: property.to_string(),
                            reference,
                        });
                    }
                }
                Err(err) => issues.push(Issue::UnparseableCondition {
                    field: field.name.clone(),
                    property: property.to_string(),
                    error: err.to_string(),
                }),
            }
        }
        if field.columns.as_ref().is_some_and(|columns| columns.has_both_forms()) {
            issues.push(Issue::DualColumnForms {
                field: field.name.clone(),
            });
        }
    }

    issues
}
