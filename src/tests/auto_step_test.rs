use indoc::indoc;

use crate::kernel::atom::DjPair;
use crate::tests::common::*;
use crate::worksheet::step::UnificationStatus;

#[test]
fn test_auto_step_finds_assertion_and_hyps() {
    let mut session = load(
        r#"{"label": "at", "seq": 100}"#,
        indoc! {r#"
        [
            {"label": "h1", "hyp": "at.1", "formula": "ph"},
            {"label": "h2", "hyp": "at.2", "formula": "wi(ph, ps)"},
            {"label": "3", "auto": true, "formula": "ps"}
        ]
        "#},
    );
    let outcome = unify(&mut session);
    assert!(outcome.is_proved(), "{:?}", outcome.diagnostics);
    assert_eq!(reference(&session, "3").as_deref(), Some("ax-mp"));
    assert_eq!(status(&session, "3"), UnificationStatus::Unified);

    let ws = &session.worksheet;
    let id = ws.find_step("3").unwrap();
    let hyps: Vec<&str> = ws.derivation(id).hyps.iter().map(|h| ws.label(h.unwrap())).collect();
    assert_eq!(hyps, vec!["h1", "h2"]);
    assert_eq!(rpn(&outcome), "ph ps at.1 at.2 ax-mp");
}

#[test]
fn test_duplicate_auto_step_is_dropped() {
    let mut session = load(
        r#"{"label": "dup", "seq": 100}"#,
        indoc! {r#"
        [
            {"label": "h1", "hyp": "dup.1", "formula": "ph"},
            {"label": "h2", "hyp": "dup.2", "formula": "wi(ph, ps)"},
            {"label": "3", "auto": true, "formula": "ph"},
            {"label": "4", "ref": "ax-mp", "hyps": ["3", "h2"], "formula": "ps"}
        ]
        "#},
    );
    let outcome = unify(&mut session);
    assert!(outcome.is_proved(), "{:?}", outcome.diagnostics);
    assert!(!order(&session).contains(&"3".to_string()));
    assert_eq!(rpn(&outcome), "ph ps dup.1 dup.2 ax-mp");
}

#[test]
fn test_possible_completion_is_applied() {
    let mut session = load(
        r#"{"label": "pos", "seq": 100}"#,
        r#"[{"label": "1", "auto": true, "formula": "wi(ps, wal(y, ps))"}]"#,
    );
    let outcome = unify(&mut session);
    assert!(outcome.is_proved(), "{:?}", outcome.diagnostics);
    assert_eq!(reference(&session, "1").as_deref(), Some("ax-5"));
    assert_eq!(status(&session, "1"), UnificationStatus::Unified);
    assert_eq!(outcome.dj_vars_to_declare, vec![DjPair::new(1, 7)]);
}

#[test]
fn test_possible_completion_is_reported() {
    let mut session = load_with_config(
        r#"{"label": "pos", "seq": 100}"#,
        r#"[{"label": "1", "auto": true, "formula": "wi(ps, wal(y, ps))"}]"#,
        r#"{"dj_vars_soft_errors": "report"}"#,
    );
    let outcome = unify(&mut session);
    assert_eq!(codes(&outcome), vec!["I-PA-0419", "I-PA-0411"]);
    assert_eq!(
        outcome.diagnostics[0].message,
        "ax-5 would complete the step with $d ps y $."
    );
    assert!(reference(&session, "1").is_none());
    assert!(outcome.qed_proof.is_none());
}

#[test]
fn test_auto_step_without_candidates_is_not_unified() {
    let mut session = load(
        r#"{"label": "none", "seq": 100}"#,
        r#"[{"label": "1", "auto": true, "formula": "wi(ph, ps)"}]"#,
    );
    let outcome = unify(&mut session);
    assert_eq!(codes(&outcome), vec!["I-PA-0411"]);
    assert_eq!(status(&session, "1"), UnificationStatus::NotUnified);
}
