use indoc::indoc;

use crate::session::Session;
use crate::unify::UnifyOutcome;
use crate::worksheet::step::UnificationStatus;

// A small propositional and predicate logic, in the shape of set.mm.
const SIGNATURE: &str = indoc! {r#"
    "types": [
        {"name": "wff", "work_var_prefix": "&W"},
        {"name": "setvar", "work_var_prefix": "&S"},
        {"name": "class", "work_var_prefix": "&C"}
    ],
    "syntax": [
        {"label": "wn", "result": "wff", "args": ["wff"]},
        {"label": "wi", "result": "wff", "args": ["wff", "wff"]},
        {"label": "wa", "result": "wff", "args": ["wff", "wff"]},
        {"label": "wal", "result": "wff", "args": ["setvar", "wff"]},
        {"label": "weq", "result": "wff", "args": ["setvar", "setvar"]}
    ],
    "variables": [
        {"name": "ph", "type": "wff"},
        {"name": "ps", "type": "wff"},
        {"name": "ch", "type": "wff"},
        {"name": "th", "type": "wff"},
        {"name": "ta", "type": "wff"},
        {"name": "et", "type": "wff"},
        {"name": "x", "type": "setvar"},
        {"name": "y", "type": "setvar"},
        {"name": "z", "type": "setvar"},
        {"name": "u", "type": "setvar"},
        {"name": "v", "type": "setvar"}
    ]
"#};

const ASSERTIONS: &str = indoc! {r#"
        {"label": "ax-1", "seq": 1, "formula": "wi(ph, wi(ps, ph))"},
        {"label": "ax-2", "seq": 2,
         "formula": "wi(wi(ph, wi(ps, ch)), wi(wi(ph, ps), wi(ph, ch)))"},
        {"label": "ax-3", "seq": 3, "formula": "wi(wi(wn(ph), wn(ps)), wi(ps, ph))"},
        {"label": "ax-4", "seq": 4, "formula": "wi(wal(x, ph), ph)"},
        {"label": "ax-5", "seq": 5, "formula": "wi(ph, wal(x, ph))", "dj": [["x", "ph"]]},
        {"label": "ax-mp", "seq": 10, "hyps": ["ph", "wi(ph, ps)"], "formula": "ps"},
        {"label": "ax-gen", "seq": 11, "hyps": ["ph"], "formula": "wal(x, ph)"},
        {"label": "a1i", "seq": 20, "hyps": ["ph"], "formula": "wi(ps, ph)"},
        {"label": "syl", "seq": 30, "hyps": ["wi(ph, ps)", "wi(ps, ch)"], "formula": "wi(ph, ch)"},
        {"label": "mp6", "seq": 40,
         "hyps": ["ph", "ps", "wi(ph, ch)", "wi(ps, th)", "wi(ch, wi(th, ta))", "wi(ta, et)"],
         "formula": "et"}
"#};

pub fn session_json(theorem: &str, steps: &str, config: &str) -> String {
    session_json_with(&[], theorem, steps, config)
}

/// Each entry of `extra` is an assertion object, appended to the catalog.
pub fn session_json_with(extra: &[&str], theorem: &str, steps: &str, config: &str) -> String {
    let mut assertions = ASSERTIONS.trim_end().to_string();
    for a in extra {
        assertions.push_str(",\n");
        assertions.push_str(a);
    }
    format!(
        "{{ {}, \"assertions\": [{}], \"theorem\": {}, \"steps\": {}, \"config\": {} }}",
        SIGNATURE, assertions, theorem, steps, config
    )
}

pub fn load(theorem: &str, steps: &str) -> Session {
    load_with_config(theorem, steps, "{}")
}

pub fn load_with_config(theorem: &str, steps: &str, config: &str) -> Session {
    load_with_assertions(&[], theorem, steps, config)
}

pub fn load_with_assertions(extra: &[&str], theorem: &str, steps: &str, config: &str) -> Session {
    match Session::from_json(&session_json_with(extra, theorem, steps, config)) {
        Ok(session) => session,
        Err(e) => panic!("session failed to load: {}", e),
    }
}

/// Expects the pass to finish without a fatal error.
pub fn unify(session: &mut Session) -> UnifyOutcome {
    match session.unify() {
        Ok(outcome) => outcome,
        Err(e) => panic!("unification failed: {}", e),
    }
}

pub fn codes(outcome: &UnifyOutcome) -> Vec<&'static str> {
    outcome.diagnostics.iter().map(|d| d.code.code()).collect()
}

pub fn status(session: &Session, label: &str) -> UnificationStatus {
    let ws = &session.worksheet;
    match ws.find_step(label) {
        Some(id) => ws.derivation(id).status,
        None => panic!("no step {}", label),
    }
}

pub fn formula(session: &Session, label: &str) -> String {
    let ws = &session.worksheet;
    let id = ws.find_step(label).expect("no such step");
    match ws.formula(id) {
        Some(f) => f.display(&session.symbols).to_string(),
        None => "?".to_string(),
    }
}

pub fn reference(session: &Session, label: &str) -> Option<String> {
    let ws = &session.worksheet;
    let id = ws.find_step(label).expect("no such step");
    ws.derivation(id)
        .reference
        .map(|a| session.catalog.get(a).label.clone())
}

pub fn rpn(outcome: &UnifyOutcome) -> String {
    match &outcome.qed_rpn {
        Some(labels) => labels.join(" "),
        None => panic!("no qed proof"),
    }
}

/// The labels of the steps in proof order.
pub fn order(session: &Session) -> Vec<String> {
    let ws = &session.worksheet;
    ws.order().iter().map(|id| ws.label(*id).to_string()).collect()
}
