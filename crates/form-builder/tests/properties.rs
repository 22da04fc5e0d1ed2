use std::collections::BTreeSet;

use form_builder::palette::stepper;
use form_builder::{Field, FieldTree, Viewport};
use form_logic::mentions;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Add { base: String, pos: isize },
    Copy { index: usize },
    AddStep,
    DuplicateStep { index: usize },
    SelectStep { index: usize },
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => ("(email|name|age|email_1|x_2)", -2isize..8).prop_map(|(base, pos)| Op::Add { base, pos }),
        3 => (0usize..8).prop_map(|index| Op::Copy { index }),
        1 => Just(Op::AddStep),
        1 => (0usize..4).prop_map(|index| Op::DuplicateStep { index }),
        1 => (0usize..4).prop_map(|index| Op::SelectStep { index }),
    ]
}

fn apply(tree: &mut FieldTree, op: &Op) {
    match op {
        Op::Add { base, pos } => {
            tree.add_field(Field::new(base.as_str()), Some(*pos)).expect("add");
        }
        Op::Copy { index } => {
            tree.copy_field(*index).expect("copy");
        }
        Op::AddStep => {
            let _ = tree.add_step(None);
        }
        Op::DuplicateStep { index } => {
            if let Some(name) = tree.steps().get(*index).map(|step| step.name.clone()) {
                tree.duplicate_step(&name).expect("duplicate");
            }
        }
        Op::SelectStep { index } => {
            if let Some(name) = tree.steps().get(*index).map(|step| step.name.clone()) {
                tree.set_active_step(&name).expect("select");
            }
        }
    }
}

fn assert_unique(tree: &FieldTree) -> Result<(), TestCaseError> {
    let mut seen = BTreeSet::new();
    for field in tree.all_fields() {
        prop_assert!(seen.insert(field.name.clone()), "duplicate name {}", field.name);
    }
    Ok(())
}

proptest! {
    #[test]
    fn names_stay_unique(with_stepper in any::<bool>(), ops in proptest::collection::vec(op(), 1..40)) {
        let mut tree = FieldTree::new();
        if with_stepper {
            tree.add_field(stepper("stepper"), None).expect("stepper");
        }
        for op in &ops {
            apply(&mut tree, op);
            assert_unique(&tree)?;
        }
    }

    #[test]
    fn column_forms_never_coexist(
        writes in proptest::collection::vec(
            (proptest::sample::select(Viewport::ALL.to_vec()), 0u8..20),
            1..20,
        ),
        legacy in proptest::option::of(1u8..13),
    ) {
        let mut tree = FieldTree::new();
        tree.add_field(Field::new("a"), None).expect("add");
        if let Some(span) = legacy {
            tree.update_property("a", "columns", serde_json::json!({ "container": span }))
                .expect("legacy");
        }
        tree.set_active_field(Some("a"));
        for (viewport, span) in writes {
            tree.set_viewport(viewport);
            let stored = tree.update_active_field_columns(span).expect("write");
            prop_assert!((1..=12).contains(&stored));
            prop_assert_eq!(tree.active_field_columns(), stored);
            let columns = tree.field("a").and_then(|field| field.columns.clone()).expect("columns");
            prop_assert!(!columns.has_both_forms());
        }
    }

    #[test]
    fn removal_leaves_no_references(
        referenced in proptest::sample::subsequence(vec!["a", "b", "c", "ab"], 1..4),
        victim in proptest::sample::select(vec!["a", "b", "c", "ab"]),
    ) {
        let mut tree = FieldTree::new();
        for name in ["a", "b", "c", "ab"] {
            tree.add_field(Field::new(name), None).expect("add");
        }
        let expression = referenced
            .iter()
            .enumerate()
            .map(|(i, name)| format!("${name} > {i}"))
            .collect::<Vec<_>>()
            .join(" || ");
        tree.add_field(Field::new("target").with_condition(expression), None).expect("target");

        tree.remove_field(victim, None).expect("removed");
        let condition = tree.field("target").and_then(|field| field.condition.clone());
        if let Some(condition) = condition {
            prop_assert!(!mentions(&condition, victim));
        } else {
            prop_assert!(referenced.iter().all(|name| *name == victim));
        }
    }
}
