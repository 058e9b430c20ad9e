use indoc::indoc;

use crate::error::UnifyError;
use crate::tests::common::*;
use crate::worksheet::step::UnificationStatus;

// ph follows from ph by generalizing and then specializing. The bound variable is a
// work variable until the very end.
const STEPS: &str = indoc! {r#"
    [
        {"label": "h1", "hyp": "gs.1", "formula": "ph"},
        {"label": "2", "ref": "ax-gen", "hyps": ["h1"]},
        {"label": "3", "ref": "ax-4"},
        {"label": "4", "ref": "ax-mp", "hyps": ["2", "3"], "formula": "ph"}
    ]
"#};

#[test]
fn test_work_vars_become_dummy_vars() {
    let mut session = load(
        r#"{"label": "gs", "seq": 100, "variables": ["ph", "x", "y"]}"#,
        STEPS,
    );
    let outcome = unify(&mut session);
    assert!(outcome.is_proved(), "{:?}", outcome.diagnostics);
    assert_eq!(formula(&session, "2"), "wal(x, ph)");
    assert_eq!(formula(&session, "3"), "wi(wal(x, ph), ph)");
    for label in ["2", "3", "4"] {
        assert_eq!(status(&session, label), UnificationStatus::Unified);
    }
    assert_eq!(outcome.stats.work_vars_converted, 1);
    assert_eq!(
        rpn(&outcome),
        "x ph wal ph ph x gs.1 ax-gen ph x ax-4 ax-mp"
    );
}

#[test]
fn test_dummy_skips_mandatory_vars() {
    // x appears in a hypothesis, so the work variable gets y.
    let mut session = load(
        r#"{"label": "gs", "seq": 100, "variables": ["ph", "x", "y"]}"#,
        indoc! {r#"
        [
            {"label": "h1", "hyp": "gs.1", "formula": "ph"},
            {"label": "h2", "hyp": "gs.2", "formula": "weq(x, x)"},
            {"label": "3", "ref": "ax-gen", "hyps": ["h1"]},
            {"label": "4", "ref": "ax-4"},
            {"label": "5", "ref": "ax-mp", "hyps": ["3", "4"], "formula": "ph"}
        ]
        "#},
    );
    let outcome = unify(&mut session);
    assert!(outcome.is_proved(), "{:?}", outcome.diagnostics);
    assert_eq!(formula(&session, "3"), "wal(y, ph)");
}

#[test]
fn test_shortage_of_dummy_vars_is_fatal() {
    let mut session = load(
        r#"{"label": "gs", "seq": 100, "variables": ["ph"]}"#,
        STEPS,
    );
    match session.unify() {
        Err(UnifyError::DummyVarShortage {
            theorem,
            type_name,
            available,
        }) => {
            assert_eq!(theorem, "gs");
            assert_eq!(type_name, "setvar");
            assert_eq!(available, 0);
        }
        other => panic!("expected a shortage, got {:?}", other.map(|o| o.diagnostics)),
    }
}

#[test]
fn test_conversion_can_be_disabled() {
    let mut session = load_with_config(
        r#"{"label": "gs", "seq": 100, "variables": ["ph", "x", "y"]}"#,
        STEPS,
        r#"{"convert_work_vars": false}"#,
    );
    let outcome = unify(&mut session);
    assert_eq!(codes(&outcome), vec!["I-PA-0418"]);
    assert_eq!(outcome.diagnostics[0].step.as_deref(), Some("2"));
    assert!(outcome.qed_rpn.is_none());
    assert_eq!(status(&session, "4"), UnificationStatus::UnifiedWithWorkVars);
    assert!(formula(&session, "2").starts_with("wal(&S"));
}

// Steps 2 and 3 share no work variable, but step 4 holds both of theirs, so &S1 and &S2
// end up in one class. The q steps carry &W1, which never meets a setvar work variable.
const CHAIN_STEPS: &str = indoc! {r#"
    [
        {"label": "h1", "hyp": "ch.1", "formula": "ph"},
        {"label": "q1", "ref": "ax-1", "formula": "wi(&W1, wi(ph, &W1))"},
        {"label": "q2", "ref": "ax-1", "formula": "wi(ph, wi(wi(&W1, wi(ph, &W1)), ph))"},
        {"label": "q3", "ref": "ax-mp", "hyps": ["h1", "q2"],
            "formula": "wi(wi(&W1, wi(ph, &W1)), ph)"},
        {"label": "q4", "ref": "ax-mp", "hyps": ["q1", "q3"], "formula": "ph"},
        {"label": "2", "ref": "ax-gen", "hyps": ["q4"], "formula": "wal(&S1, ph)"},
        {"label": "3", "ref": "ax-gen", "hyps": ["h1"], "formula": "wal(&S2, ph)"},
        {"label": "4", "ref": "ax-1",
            "formula": "wi(wal(&S2, ph), wi(wal(&S1, ph), wal(&S2, ph)))"},
        {"label": "5", "ref": "ax-mp", "hyps": ["3", "4"],
            "formula": "wi(wal(&S1, ph), wal(&S2, ph))"},
        {"label": "6", "ref": "ax-mp", "hyps": ["2", "5"], "formula": "wal(&S2, ph)"},
        {"label": "7", "ref": "ax-4", "formula": "wi(wal(&S2, ph), ph)"},
        {"label": "8", "ref": "ax-mp", "hyps": ["6", "7"], "formula": "ph"}
    ]
"#};

#[test]
fn test_transitively_linked_work_vars_share_a_class() {
    let mut session = load(
        r#"{"label": "ch", "seq": 100, "variables": ["ph", "ch", "x", "y"]}"#,
        CHAIN_STEPS,
    );
    let outcome = unify(&mut session);
    assert!(outcome.is_proved(), "{:?}", outcome.diagnostics);
    assert_eq!(outcome.stats.work_vars_converted, 3);

    // The setvar class gets distinct dummies, used the same way in every step.
    assert_eq!(formula(&session, "2"), "wal(x, ph)");
    assert_eq!(formula(&session, "3"), "wal(y, ph)");
    assert_eq!(formula(&session, "5"), "wi(wal(x, ph), wal(y, ph))");
    assert_eq!(formula(&session, "6"), "wal(y, ph)");
    assert_eq!(formula(&session, "7"), "wi(wal(y, ph), ph)");

    // The wff class is separate and gets a wff.
    assert_eq!(formula(&session, "q1"), "wi(ch, wi(ph, ch))");
    assert_eq!(formula(&session, "q3"), "wi(wi(ch, wi(ph, ch)), ph)");

    for label in ["q1", "q3", "q4", "2", "4", "6", "8"] {
        assert_eq!(status(&session, label), UnificationStatus::Unified, "step {}", label);
    }
}

#[test]
fn test_linked_work_vars_need_one_dummy_each() {
    // One setvar is not enough for a class with two work variables.
    let mut session = load(
        r#"{"label": "ch", "seq": 100, "variables": ["ph", "ch", "x"]}"#,
        CHAIN_STEPS,
    );
    match session.unify() {
        Err(UnifyError::DummyVarShortage {
            type_name,
            available,
            ..
        }) => {
            assert_eq!(type_name, "setvar");
            assert_eq!(available, 1);
        }
        other => panic!("expected a shortage, got {:?}", other.map(|o| o.diagnostics)),
    }
}
