use indoc::indoc;

use crate::error::ErrorCode;
use crate::tests::common::*;
use crate::worksheet::step::UnificationStatus;

const ID_THEOREM: &str = r#"{"label": "idt", "seq": 100}"#;

// The set.mm proof of ph -> ph.
const ID_RPN: &str = "ph ph ph wi wi ph ph wi ph ph ax-1 \
    ph ph ph wi ph wi wi ph ph ph wi wi ph ph wi wi \
    ph ph ph wi ax-1 ph ph ph wi ph ax-2 ax-mp ax-mp";

#[test]
fn test_id_with_refs() {
    let mut session = load(
        ID_THEOREM,
        indoc! {r#"
        [
            {"label": "1", "ref": "ax-1", "formula": "wi(ph, wi(wi(ph, ph), ph))"},
            {"label": "2", "ref": "ax-2",
             "formula": "wi(wi(ph, wi(wi(ph, ph), ph)), wi(wi(ph, wi(ph, ph)), wi(ph, ph)))"},
            {"label": "3", "ref": "ax-mp", "hyps": ["1", "2"],
             "formula": "wi(wi(ph, wi(ph, ph)), wi(ph, ph))"},
            {"label": "4", "ref": "ax-1", "formula": "wi(ph, wi(ph, ph))"},
            {"label": "5", "ref": "ax-mp", "hyps": ["4", "3"], "formula": "wi(ph, ph)"}
        ]
        "#},
    );
    let outcome = unify(&mut session);
    assert!(outcome.diagnostics.is_empty(), "{:?}", outcome.diagnostics);
    assert!(outcome.is_proved());
    assert_eq!(rpn(&outcome), ID_RPN);
    for label in ["1", "2", "3", "4", "5"] {
        assert_eq!(status(&session, label), UnificationStatus::Unified);
    }
    assert_eq!(outcome.stats.proofs_built, 5);
}

#[test]
fn test_id_found_by_search() {
    let mut session = load(
        ID_THEOREM,
        indoc! {r#"
        [
            {"label": "1", "formula": "wi(ph, wi(wi(ph, ph), ph))"},
            {"label": "2",
             "formula": "wi(wi(ph, wi(wi(ph, ph), ph)), wi(wi(ph, wi(ph, ph)), wi(ph, ph)))"},
            {"label": "3", "hyps": ["1", "2"], "formula": "wi(wi(ph, wi(ph, ph)), wi(ph, ph))"},
            {"label": "4", "formula": "wi(ph, wi(ph, ph))"},
            {"label": "5", "hyps": ["4", "3"], "formula": "wi(ph, ph)"}
        ]
        "#},
    );
    let outcome = unify(&mut session);
    assert!(outcome.is_proved());
    assert_eq!(rpn(&outcome), ID_RPN);
    assert_eq!(reference(&session, "1").as_deref(), Some("ax-1"));
    assert_eq!(reference(&session, "2").as_deref(), Some("ax-2"));
    assert_eq!(reference(&session, "5").as_deref(), Some("ax-mp"));
}

#[test]
fn test_search_respects_exclusions() {
    let mut session = load_with_config(
        ID_THEOREM,
        indoc! {r#"
        [
            {"label": "1", "formula": "wi(ph, wi(wi(ph, ph), ph))"},
            {"label": "2",
             "formula": "wi(wi(ph, wi(wi(ph, ph), ph)), wi(wi(ph, wi(ph, ph)), wi(ph, ph)))"},
            {"label": "3", "hyps": ["1", "2"], "formula": "wi(wi(ph, wi(ph, ph)), wi(ph, ph))"},
            {"label": "4", "formula": "wi(ph, wi(ph, ph))"},
            {"label": "5", "hyps": ["4", "3"], "formula": "wi(ph, ph)"}
        ]
        "#},
        r#"{"unify_search_exclude": ["ax-1"]}"#,
    );
    let outcome = unify(&mut session);
    assert!(!outcome.is_proved());
    assert_eq!(codes(&outcome), vec!["I-PA-0411", "I-PA-0411"]);
    assert_eq!(outcome.diagnostics[0].step.as_deref(), Some("1"));
    assert_eq!(outcome.diagnostics[1].step.as_deref(), Some("4"));
    assert_eq!(status(&session, "3"), UnificationStatus::UnifiedWithIncompleteHyps);
    assert_eq!(status(&session, "5"), UnificationStatus::UnifiedWithIncompleteHyps);
}

#[test]
fn test_later_assertions_are_not_candidates() {
    // syl comes after the theorem, so the step has nothing to unify with.
    let mut session = load(
        r#"{"label": "early", "seq": 25}"#,
        indoc! {r#"
        [
            {"label": "h1", "hyp": "early.1", "formula": "wi(ph, ps)"},
            {"label": "h2", "hyp": "early.2", "formula": "wi(ps, ch)"},
            {"label": "3", "hyps": ["h1", "h2"], "formula": "wi(ph, ch)"}
        ]
        "#},
    );
    let outcome = unify(&mut session);
    assert_eq!(codes(&outcome), vec!["I-PA-0411"]);
    assert_eq!(status(&session, "3"), UnificationStatus::NotUnified);
}

#[test]
fn test_two_hyps_get_swapped() {
    let mut session = load(
        r#"{"label": "mpt", "seq": 100}"#,
        indoc! {r#"
        [
            {"label": "h1", "hyp": "mpt.1", "formula": "ph"},
            {"label": "h2", "hyp": "mpt.2", "formula": "wi(ph, ps)"},
            {"label": "3", "ref": "ax-mp", "hyps": ["h2", "h1"], "formula": "ps"}
        ]
        "#},
    );
    let outcome = unify(&mut session);
    assert!(outcome.is_proved());
    assert_eq!(rpn(&outcome), "ph ps mpt.1 mpt.2 ax-mp");

    let ws = &session.worksheet;
    let qed = ws.qed().unwrap();
    let hyps: Vec<&str> = ws.derivation(qed).hyps.iter().map(|h| ws.label(h.unwrap())).collect();
    assert_eq!(hyps, vec!["h1", "h2"]);
}

#[test]
fn test_ref_that_does_not_unify() {
    let mut session = load(
        r#"{"label": "bad", "seq": 100}"#,
        indoc! {r#"
        [
            {"label": "h1", "hyp": "bad.1", "formula": "ph"},
            {"label": "h2", "hyp": "bad.2", "formula": "wi(ph, ps)"},
            {"label": "3", "ref": "ax-mp", "hyps": ["h1", "h2"], "formula": "ch"}
        ]
        "#},
    );
    let outcome = unify(&mut session);
    assert!(!outcome.is_proved());
    assert_eq!(outcome.diagnostics.len(), 1);
    assert_eq!(outcome.diagnostics[0].code, ErrorCode::RefUnify);
    assert_eq!(
        outcome.diagnostics[0].to_string(),
        "E-PA-0410 Step 3: ax-mp does not unify with the step"
    );
    assert_eq!(status(&session, "3"), UnificationStatus::UnificationError);
}

#[test]
fn test_missing_hyp_proof_leaves_hyps_incomplete() {
    // Step 2 has nothing that unifies, so step 3 has no proof for its first hyp.
    let mut session = load(
        r#"{"label": "inc", "seq": 100}"#,
        indoc! {r#"
        [
            {"label": "h1", "hyp": "inc.1", "formula": "wi(ph, ps)"},
            {"label": "2", "formula": "ph"},
            {"label": "3", "ref": "ax-mp", "hyps": ["2", "h1"], "formula": "ps"}
        ]
        "#},
    );
    let outcome = unify(&mut session);
    assert!(outcome.qed_proof.is_none());
    assert_eq!(codes(&outcome), vec!["I-PA-0411"]);
    assert_eq!(status(&session, "2"), UnificationStatus::NotUnified);
    assert_eq!(status(&session, "3"), UnificationStatus::UnifiedWithIncompleteHyps);
}

#[test]
fn test_outcome_serializes_without_proof_tree() {
    let mut session = load(
        r#"{"label": "mpt", "seq": 100}"#,
        indoc! {r#"
        [
            {"label": "h1", "hyp": "mpt.1", "formula": "ph"},
            {"label": "h2", "hyp": "mpt.2", "formula": "wi(ph, ps)"},
            {"label": "3", "hyps": ["h1", "h2"], "formula": "ps"}
        ]
        "#},
    );
    let outcome = unify(&mut session);
    let value = serde_json::to_value(&outcome).unwrap();
    assert!(value.get("qed_proof").is_none());
    assert_eq!(value["qed_rpn"][4], "ax-mp");
    assert_eq!(value["stats"]["proofs_built"], 1);
}

#[test]
fn test_second_pass_changes_nothing() {
    let mut session = load(
        ID_THEOREM,
        indoc! {r#"
        [
            {"label": "1", "formula": "wi(ph, wi(wi(ph, ph), ph))"},
            {"label": "2",
             "formula": "wi(wi(ph, wi(wi(ph, ph), ph)), wi(wi(ph, wi(ph, ph)), wi(ph, ph)))"},
            {"label": "3", "hyps": ["1", "2"], "formula": "wi(wi(ph, wi(ph, ph)), wi(ph, ph))"},
            {"label": "4", "formula": "wi(ph, wi(ph, ph))"},
            {"label": "5", "hyps": ["4", "3"], "formula": "wi(ph, ph)"}
        ]
        "#},
    );
    let first = unify(&mut session);
    assert!(first.is_proved());
    let refs: Vec<Option<String>> = order(&session)
        .iter()
        .map(|l| reference(&session, l))
        .collect();

    let second = unify(&mut session);
    assert!(second.diagnostics.is_empty(), "{:?}", second.diagnostics);
    assert_eq!(second.qed_rpn, first.qed_rpn);
    assert_eq!(second.stats.pairwise_attempts, 0);
    let again: Vec<Option<String>> = order(&session)
        .iter()
        .map(|l| reference(&session, l))
        .collect();
    assert_eq!(again, refs);
    let ws = &session.worksheet;
    for label in ["1", "2", "3", "4", "5"] {
        let d = ws.derivation(ws.find_step(label).unwrap());
        assert_eq!(d.status, UnificationStatus::Unified);
        assert!(d.alternates.is_empty());
    }
}
