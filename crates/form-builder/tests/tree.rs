use form_builder::palette::stepper;
use form_builder::{Field, FieldTree, StepPatch, TreeError, Validation, Viewport};
use form_logic::{LogicField, LogicTarget, OperatorCode, mentions};
use serde_json::json;

fn layout(value: serde_json::Value) -> FieldTree {
    let fields: Vec<Field> = serde_json::from_value(value).expect("layout");
    FieldTree::from_snapshot(fields)
}

fn names(fields: &[Field]) -> Vec<&str> {
    fields.iter().map(|field| field.name.as_str()).collect()
}

fn stepped() -> FieldTree {
    layout(json!([{
        "name": "stepper",
        "type": "stepper",
        "steps": [
            { "name": "step_1", "label": "Step 1", "children": [
                { "name": "first", "type": "text" },
                { "name": "second", "type": "text", "if": "$first > 1" }
            ]},
            { "name": "step_2", "label": "Step 2", "children": [
                { "name": "third", "type": "text" }
            ]}
        ]
    }]))
}

#[test]
fn colliding_name_gets_lowest_free_suffix() {
    let mut tree = FieldTree::new();
    assert_eq!(tree.add_field(Field::new("email"), None).expect("add"), "email");
    assert_eq!(tree.add_field(Field::new("email"), Some(0)).expect("add"), "email_1");
    assert_eq!(names(tree.fields()), vec!["email_1", "email"]);
}

#[test]
fn positions_are_clamped_to_scope() {
    let mut tree = FieldTree::new();
    tree.add_field(Field::new("a"), None).expect("a");
    tree.add_field(Field::new("b"), Some(-4)).expect("b");
    tree.add_field(Field::new("c"), Some(99)).expect("c");
    tree.add_field(Field::new("d"), Some(1)).expect("d");
    assert_eq!(names(tree.fields()), vec!["b", "d", "a", "c"]);
}

#[test]
fn blank_template_names_fall_back_to_type() {
    let mut tree = FieldTree::new();
    let name = tree
        .add_field(Field::new("").with_kind("phone"), None)
        .expect("add");
    assert_eq!(name, "phone");
    assert!(matches!(
        tree.add_field(Field::new("two words"), None),
        Err(TreeError::InvalidName { .. })
    ));
}

#[test]
fn adding_a_stepper_moves_root_fields_into_first_step() {
    let mut tree = FieldTree::new();
    tree.add_field(Field::new("a"), None).expect("a");
    tree.add_field(Field::new("b"), None).expect("b");
    let name = tree.add_field(stepper("stepper"), None).expect("stepper");

    assert_eq!(name, "stepper");
    assert_eq!(names(tree.fields()), vec!["stepper"]);
    assert_eq!(names(&tree.steps()[0].children), vec!["a", "b"]);

    tree.add_field(Field::new("c"), Some(0)).expect("c");
    assert_eq!(names(tree.scope()), vec!["c", "a", "b"]);
}

#[test]
fn second_stepper_is_rejected_without_mutation() {
    let mut tree = stepped();
    let before = tree.snapshot();
    assert!(matches!(
        tree.add_field(stepper("stepper"), None),
        Err(TreeError::StepperExists)
    ));
    assert_eq!(tree.snapshot(), before);
}

#[test]
fn removing_the_last_step_is_rejected() {
    let mut tree = FieldTree::new();
    tree.add_field(stepper("stepper"), None).expect("stepper");
    let before = tree.snapshot();
    assert!(matches!(tree.remove_step("step_1"), Err(TreeError::LastStep)));
    assert_eq!(tree.snapshot(), before);
}

#[test]
fn step_operations_need_a_stepper() {
    let mut tree = FieldTree::new();
    assert!(matches!(tree.add_step(None), Err(TreeError::NoStepper)));
    assert!(matches!(tree.remove_stepper(), Err(TreeError::NoStepper)));
    assert!(matches!(
        stepped().remove_step("missing"),
        Err(TreeError::StepNotFound { .. })
    ));
}

#[test]
fn removal_scrubs_references_term_by_term() {
    let mut tree = layout(json!([
        { "name": "age" },
        { "name": "role" },
        { "name": "agent" },
        {
            "name": "note",
            "if": "$age > 18 && $role == admin",
            "validation": { "if": "$age > 18", "then": "required" },
            "disable": { "if": "$age > 1", "then": true, "else": false }
        },
        { "name": "memo", "if": "$age > 1 || $role == x" },
        { "name": "other", "if": "$agent > 1" }
    ]));

    let removed = tree.remove_field("age", None).expect("removed");
    assert_eq!(removed.name, "age");

    let note = tree.field("note").expect("note");
    assert_eq!(note.condition.as_deref(), Some("$role == admin"));
    assert_eq!(note.validation, Some(Validation::Rules("required".into())));
    assert_eq!(note.disable, None);
    assert_eq!(
        tree.field("memo").and_then(|field| field.condition.as_deref()),
        Some("$role == x")
    );
    assert_eq!(
        tree.field("other").and_then(|field| field.condition.as_deref()),
        Some("$agent > 1")
    );
    for field in tree.all_fields() {
        for (_, expression) in field.conditions() {
            assert!(!mentions(expression, "age"), "{expression}");
        }
    }
}

#[test]
fn removal_of_unknown_field_is_ignored() {
    let mut tree = layout(json!([{ "name": "a" }]));
    assert!(tree.remove_field("zzz", Some(0)).is_none());
    assert_eq!(names(tree.fields()), vec!["a"]);
}

#[test]
fn removal_reaches_inactive_steps_and_clears_selection() {
    let mut tree = stepped();
    tree.set_active_step("step_2").expect("step");
    tree.set_active_field(Some("first"));

    tree.remove_field("first", Some(0)).expect("removed");
    assert_eq!(names(&tree.steps()[0].children), vec!["second"]);
    assert_eq!(names(tree.scope()), vec!["third"]);
    assert_eq!(tree.selection().active_field, None);
    assert_eq!(tree.field("second").and_then(|field| field.condition.clone()), None);
}

#[test]
fn copy_restarts_from_base_name_and_selects_the_clone() {
    let mut tree = layout(json!([
        { "name": "email", "label": "Email" },
        { "name": "email_1" }
    ]));
    let copy = tree.copy_field(0_usize).expect("copy").expect("copied");
    assert_eq!(copy, "email_2");
    assert_eq!(names(tree.fields()), vec!["email", "email_2", "email_1"]);
    assert_eq!(tree.selection().active_field.as_deref(), Some("email_2"));
    assert_eq!(tree.fields()[1].label.as_deref(), Some("Email"));

    let copy = tree.copy_field("email_1").expect("copy").expect("copied");
    assert_eq!(copy, "email_3");
    assert_eq!(tree.copy_field(9_usize).expect("ignored"), None);
}

#[test]
fn reorder_moves_within_scope_and_ignores_stale_input() {
    let mut tree = layout(json!([{ "name": "a" }, { "name": "b" }, { "name": "c" }]));
    assert!(tree.update_field_index("a", 0, 2));
    assert_eq!(names(tree.fields()), vec!["b", "c", "a"]);

    assert!(!tree.update_field_index("a", 2, 3));
    assert!(!tree.update_field_index("zzz", 0, 1));
    assert!(!tree.update_field_index("b", 0, 0));
    assert!(tree.update_field_index("c", 0, 0));
    assert_eq!(names(tree.fields()), vec!["c", "b", "a"]);
}

#[test]
fn rename_validates_and_rewrites_references() {
    let mut tree = layout(json!([
        { "name": "a" },
        { "name": "b", "if": "$a > 1 || $empty($a)" },
        { "name": "c", "validation": { "if": "$contains($a,x)", "then": "required" } }
    ]));

    assert!(matches!(tree.rename_field("a", ""), Err(TreeError::EmptyName)));
    assert!(matches!(tree.rename_field("a", "a b"), Err(TreeError::InvalidName { .. })));
    assert!(matches!(tree.rename_field("a", "b"), Err(TreeError::DuplicateName { .. })));
    assert!(matches!(tree.rename_field("zzz", "y"), Err(TreeError::FieldNotFound { .. })));
    assert_eq!(names(tree.fields()), vec!["a", "b", "c"]);

    tree.rename_field("a", "alpha").expect("rename");
    assert_eq!(names(tree.fields()), vec!["alpha", "b", "c"]);
    assert_eq!(
        tree.field("b").and_then(|field| field.condition.as_deref()),
        Some("$alpha > 1 || $empty($alpha)")
    );
    assert_eq!(
        tree.field("c").and_then(|field| field.validation.as_ref()).and_then(Validation::condition),
        Some("$contains($alpha,x)")
    );
}

#[test]
fn names_that_would_break_conditions_are_rejected() {
    let mut tree = layout(json!([
        { "name": "price" },
        { "name": "total", "if": "$price > 5" }
    ]));

    assert!(matches!(
        tree.add_field(Field::new("price,usd"), None),
        Err(TreeError::InvalidName { .. })
    ));
    for name in ["price(usd)", "price$", "price\"usd"] {
        assert!(
            matches!(tree.rename_field("price", name), Err(TreeError::InvalidName { .. })),
            "{name}"
        );
    }
    assert_eq!(
        tree.field("total").and_then(|field| field.condition.as_deref()),
        Some("$price > 5")
    );

    tree.rename_field("price", "price.usd").expect("rename");
    let rows = tree.logic_rows("total", LogicTarget::Visibility).expect("rows");
    assert_eq!(rows, vec![LogicField::new("price.usd", OperatorCode::GreaterThan, "5")]);

    let name = tree.add_field(Field::new("net&gross"), None).expect("add");
    tree.update_logic(
        "total",
        LogicTarget::Visibility,
        &[LogicField::new(name.as_str(), OperatorCode::LessThan, "$10")],
    )
    .expect("logic");
    assert_eq!(
        tree.logic_rows("total", LogicTarget::Visibility).expect("rows"),
        vec![LogicField::new("net&gross", OperatorCode::LessThan, "$10")]
    );
}

#[test]
fn rename_inside_a_step() {
    let mut tree = stepped();
    tree.rename_field("first", "start").expect("rename");
    assert_eq!(names(&tree.steps()[0].children), vec!["start", "second"]);
    assert_eq!(
        tree.field("second").and_then(|field| field.condition.as_deref()),
        Some("$start > 1")
    );
}

#[test]
fn falsy_patches_clear_the_property() {
    let mut tree = layout(json!([{ "name": "a" }]));
    tree.set_active_field(Some("a"));

    tree.update_prop_from_active_field("label", json!("Age")).expect("label");
    tree.update_prop_from_active_field("placeholder", json!("years")).expect("placeholder");
    let field = tree.field("a").expect("a");
    assert_eq!(field.label.as_deref(), Some("Age"));
    assert_eq!(field.props.get("placeholder"), Some(&json!("years")));

    tree.update_prop_from_active_field("label", json!("")).expect("label");
    tree.update_prop_from_active_field("placeholder", json!(false)).expect("placeholder");
    tree.update_prop_from_active_field("columns", json!({ "container": null })).expect("columns");
    let field = tree.field("a").expect("a");
    assert_eq!(field.label, None);
    assert!(!field.props.contains_key("placeholder"));
    assert_eq!(field.columns, None);
    assert_eq!(serde_json::to_value(field).expect("json"), json!({ "name": "a" }));
}

#[test]
fn reserved_and_malformed_patches_are_rejected() {
    let mut tree = stepped();
    assert!(matches!(
        tree.update_property("first", "steps", json!([])),
        Err(TreeError::ReservedProperty { .. })
    ));
    assert!(matches!(
        tree.update_property("first", "type", json!("stepper")),
        Err(TreeError::ReservedProperty { .. })
    ));
    assert!(matches!(
        tree.update_property("first", "align", json!("diagonal")),
        Err(TreeError::InvalidProperty { .. })
    ));
    assert!(matches!(
        tree.update_prop_from_active_field("label", json!("x")),
        Err(TreeError::NoActiveField)
    ));

    tree.update_property("first", "name", json!("start")).expect("rename");
    assert!(tree.field("start").is_some());
}

#[test]
fn logic_targets_merge_with_stored_toggles() {
    let mut tree = layout(json!([{ "name": "age" }, { "name": "b" }]));
    let rows = vec![LogicField::new("age", OperatorCode::GreaterThan, "18")];

    tree.update_property("b", "validation", json!("required")).expect("rules");
    tree.update_logic("b", LogicTarget::Validation, &rows).expect("validation");
    tree.update_logic("b", LogicTarget::Disable, &rows).expect("disable");
    tree.update_logic("b", LogicTarget::Visibility, &rows).expect("if");
    assert_eq!(
        serde_json::to_value(tree.field("b").expect("b")).expect("json"),
        json!({
            "name": "b",
            "if": "$age > 18",
            "validation": { "if": "$age > 18", "then": "required" },
            "disable": { "if": "$age > 18", "then": true, "else": false }
        })
    );
    assert_eq!(tree.logic_rows("b", LogicTarget::Validation).expect("rows"), rows);

    tree.update_logic("b", LogicTarget::Validation, &[]).expect("validation");
    tree.update_logic("b", LogicTarget::Disable, &[]).expect("disable");
    tree.update_logic("b", LogicTarget::Visibility, &[]).expect("if");
    assert_eq!(
        serde_json::to_value(tree.field("b").expect("b")).expect("json"),
        json!({ "name": "b", "validation": "required" })
    );
    assert_eq!(
        tree.logic_rows("b", LogicTarget::Visibility).expect("rows"),
        vec![LogicField::default()]
    );
}

#[test]
fn columns_follow_the_active_viewport() {
    let mut tree = layout(json!([{ "name": "a" }]));
    assert!(matches!(
        tree.update_active_field_columns(6),
        Err(TreeError::NoActiveField)
    ));
    tree.set_active_field(Some("a"));
    assert_eq!(tree.active_field_columns(), 12);

    tree.update_active_field_columns(6).expect("default");
    assert_eq!(
        serde_json::to_value(&tree.field("a").expect("a").columns).expect("json"),
        json!({ "container": 6 })
    );

    tree.set_viewport(Viewport::Sm);
    assert_eq!(tree.active_field_columns(), 6);
    tree.update_active_field_columns(4).expect("sm");
    assert_eq!(
        serde_json::to_value(&tree.field("a").expect("a").columns).expect("json"),
        json!({ "default": { "container": 6 }, "sm": { "container": 4 } })
    );
    assert_eq!(tree.active_field_columns(), 4);

    tree.set_viewport(Viewport::Lg);
    assert_eq!(tree.active_field_columns(), 12);
    assert_eq!(tree.update_active_field_columns(40).expect("lg"), 12);
    assert_eq!(tree.update_active_field_columns(0).expect("lg"), 1);
}

#[test]
fn loading_folds_legacy_container_into_default() {
    let tree = layout(json!([{
        "name": "a",
        "columns": { "container": 3, "lg": { "container": 6 } }
    }]));
    let columns = tree.field("a").and_then(|field| field.columns.clone()).expect("columns");
    assert_eq!(columns.container, None);
    assert_eq!(columns.entry(Viewport::Default), Some(3));
}

#[test]
fn duplicate_step_renames_clones_and_their_references() {
    let mut tree = stepped();
    let name = tree.duplicate_step("step_1").expect("duplicate");
    assert_eq!(name, "step_3");

    let steps = tree.steps();
    assert_eq!(
        steps.iter().map(|step| step.name.as_str()).collect::<Vec<_>>(),
        vec!["step_1", "step_3", "step_2"]
    );
    assert_eq!(names(&steps[1].children), vec!["first_1", "second_1"]);
    assert_eq!(steps[1].children[1].condition.as_deref(), Some("$first_1 > 1"));
    assert_eq!(steps[0].children[1].condition.as_deref(), Some("$first > 1"));
}

#[test]
fn add_rename_and_update_steps() {
    let mut tree = stepped();
    let name = tree.add_step(Some("Extras")).expect("add");
    assert_eq!(name, "step_3");
    assert_eq!(tree.active_step().map(|step| step.label.as_str()), Some("Extras"));

    assert!(matches!(tree.rename_step("step_3", "step_1"), Err(TreeError::DuplicateName { .. })));
    tree.rename_step("step_3", "extras").expect("rename");
    assert_eq!(tree.selection().active_step.as_deref(), Some("extras"));

    tree.update_step(
        "extras",
        StepPatch {
            show_previous: Some(true),
            next_label: Some("Finish".into()),
            ..StepPatch::default()
        },
    )
    .expect("update");
    let step = tree.active_step().expect("step");
    assert!(step.show_previous);
    assert_eq!(step.next_label.as_deref(), Some("Finish"));
}

#[test]
fn removing_a_step_drops_its_fields_and_their_references() {
    let mut tree = stepped();
    tree.update_property("first", "if", json!("$third > 2")).expect("if");
    let removed = tree.remove_step("step_2").expect("remove");
    assert_eq!(names(&removed.children), vec!["third"]);
    assert!(tree.field("third").is_none());
    assert_eq!(tree.field("first").and_then(|field| field.condition.clone()), None);
}

#[test]
fn removing_the_stepper_flattens_steps_in_order() {
    let mut tree = stepped();
    let stepper = tree.remove_stepper().expect("remove");
    assert!(stepper.steps.is_empty());
    assert_eq!(names(tree.fields()), vec!["first", "second", "third"]);
    assert!(!tree.has_stepper());
    assert_eq!(tree.selection().active_step, None);
}
