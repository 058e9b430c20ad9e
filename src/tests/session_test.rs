use assert_fs::prelude::*;
use assert_fs::TempDir;
use indoc::indoc;

use crate::config::DjVarsSoftErrors;
use crate::error::LoadError;
use crate::session::Session;
use crate::tests::common::*;

const MP_STEPS: &str = indoc! {r#"
    [
        {"label": "h1", "hyp": "st.1", "formula": "ph"},
        {"label": "h2", "hyp": "st.2", "formula": "wi(ph, ps)"},
        {"label": "3", "ref": "ax-mp", "hyps": ["h1", "h2"], "formula": "ps"}
    ]
"#};

fn load_error(theorem: &str, steps: &str) -> LoadError {
    match Session::from_json(&session_json(theorem, steps, "{}")) {
        Ok(_) => panic!("expected the session to be rejected"),
        Err(e) => e,
    }
}

#[test]
fn test_load_from_file() {
    let temp = TempDir::new().unwrap();
    let file = temp.child("st.json");
    file.write_str(&session_json(
        r#"{"label": "st", "seq": 100}"#,
        MP_STEPS,
        r#"{"dj_vars_soft_errors": "report", "work_var_limit": 50}"#,
    ))
    .unwrap();

    let mut session = Session::load(file.path()).unwrap();
    assert_eq!(session.config.dj_vars_soft_errors, DjVarsSoftErrors::Report);
    assert_eq!(session.config.work_var_limit, 50);
    assert!(session.config.recheck_proofs);
    assert_eq!(order(&session), vec!["h1", "h2", "3"]);

    let outcome = unify(&mut session);
    assert_eq!(rpn(&outcome), "ph ps st.1 st.2 ax-mp");
}

#[test]
fn test_missing_file() {
    let temp = TempDir::new().unwrap();
    let result = Session::load(&temp.path().join("nothing.json"));
    assert!(matches!(result, Err(LoadError::Io(_))));
}

#[test]
fn test_bad_json() {
    let result = Session::from_json("{\"types\": [");
    assert!(matches!(result, Err(LoadError::Json(_))));
}

#[test]
fn test_unknown_assertion() {
    let e = load_error(
        r#"{"label": "st", "seq": 100}"#,
        r#"[{"label": "1", "ref": "ax-nope", "formula": "ph"}]"#,
    );
    assert!(e.to_string().contains("unknown assertion 'ax-nope'"), "{}", e);
}

#[test]
fn test_unknown_step() {
    let e = load_error(
        r#"{"label": "st", "seq": 100}"#,
        r#"[{"label": "1", "ref": "a1i", "hyps": ["h9"], "formula": "wi(ps, ph)"}]"#,
    );
    assert!(e.to_string().contains("unknown step 'h9'"), "{}", e);
}

#[test]
fn test_hyp_count_must_match_ref() {
    let e = load_error(
        r#"{"label": "st", "seq": 100}"#,
        indoc! {r#"
        [
            {"label": "h1", "hyp": "st.1", "formula": "ph"},
            {"label": "3", "ref": "ax-mp", "hyps": ["h1"], "formula": "ps"}
        ]
        "#},
    );
    assert_eq!(e.to_string(), "step 3 has 1 hyps but ax-mp has 2");
}

#[test]
fn test_hypothesis_cannot_have_work_vars() {
    let e = load_error(
        r#"{"label": "st", "seq": 100}"#,
        r#"[{"label": "h1", "hyp": "st.1", "formula": "wi(ph, &W1)"}]"#,
    );
    assert!(matches!(e, LoadError::Invalid(_)));
}

#[test]
fn test_self_distinct_variable_is_rejected() {
    let e = load_error(
        r#"{"label": "st", "seq": 100, "dj": [["x", "x"]]}"#,
        MP_STEPS,
    );
    assert!(e.to_string().contains("distinct from itself"), "{}", e);
}

#[test]
fn test_new_theorem_uses_step_labels() {
    let mut session = load(r#"{"label": "st", "seq": 100, "new": true}"#, MP_STEPS);
    let outcome = unify(&mut session);
    assert_eq!(rpn(&outcome), "ph ps h1 h2 ax-mp");
}
