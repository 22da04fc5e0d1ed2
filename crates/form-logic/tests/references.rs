use form_logic::{Pruned, mentions, prune_references, references, rename_references};

#[test]
fn collects_every_referenced_name() {
    let names = references("$a > 1 || $b == x && $empty($c)").expect("parse");
    assert_eq!(
        names.into_iter().collect::<Vec<_>>(),
        vec!["a".to_string(), "b".into(), "c".into()]
    );
}

#[test]
fn mentions_matches_whole_tokens_only() {
    assert!(mentions("$email > 1", "email"));
    assert!(mentions("$empty($email)", "email"));
    assert!(mentions("$contains($email,x)", "email"));
    assert!(mentions("$email", "email"));
    assert!(!mentions("$email_1 > 1", "email"));
    assert!(!mentions("$emails == x", "email"));
    assert!(!mentions("$age > 1", ""));
}

#[test]
fn prune_drops_only_referencing_conditions() {
    assert_eq!(
        prune_references("$a > 1 && $b > 2", "a"),
        Pruned::Rewritten("$b > 2".into())
    );
    assert_eq!(
        prune_references("$a > 1 || $b == x || $b == y", "a"),
        Pruned::Rewritten("$b == x || $b == y".into())
    );
    assert_eq!(
        prune_references("$b > 1 || $a == x", "a"),
        Pruned::Rewritten("$b > 1".into())
    );
    assert_eq!(prune_references("$a > 1 || $a == x", "a"), Pruned::Emptied);
    assert_eq!(prune_references("$b > 1", "a"), Pruned::Untouched);
    assert_eq!(prune_references("$ab > 1", "a"), Pruned::Untouched);
}

#[test]
fn prune_falls_back_to_token_match_for_unparseable_expressions() {
    assert_eq!(prune_references("$a ~ 1", "a"), Pruned::Emptied);
    assert_eq!(prune_references("$b ~ 1", "a"), Pruned::Untouched);
}

#[test]
fn rename_rewrites_every_reference() {
    assert_eq!(
        rename_references("$a > 1 || $empty($a) && $contains($b,a)", "a", "alpha").as_deref(),
        Some("$alpha > 1 || $empty($alpha) && $contains($b,a)")
    );
    assert_eq!(rename_references("$b > 1", "a", "alpha"), None);
}

#[test]
fn rename_falls_back_to_token_replacement() {
    assert_eq!(
        rename_references("$a ~ 1 && $ab ~ 2", "a", "z").as_deref(),
        Some("$z ~ 1 && $ab ~ 2")
    );
}

#[test]
fn remap_applies_renames_simultaneously() {
    let renames: std::collections::BTreeMap<String, String> = [("a", "b"), ("b", "c")]
        .into_iter()
        .map(|(from, to)| (from.to_string(), to.to_string()))
        .collect();
    assert_eq!(
        form_logic::remap_references("$a > 1 && $b > 2", &renames).as_deref(),
        Some("$b > 1 && $c > 2")
    );
    assert_eq!(
        form_logic::remap_references("$a ~ 1 && $b ~ 2", &renames).as_deref(),
        Some("$b ~ 1 && $c ~ 2")
    );
}
