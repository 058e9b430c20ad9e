use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::ErrorCode;
use crate::session::Session;
use crate::tests::common::*;
use crate::worksheet::step::UnificationStatus;

// The hyps of mp6 with ph := wn(ph) and ps := wa(ph, ps), in mp6's order.
const MP6_HYPS: [&str; 6] = [
    "wn(ph)",
    "wa(ph, ps)",
    "wi(wn(ph), ch)",
    "wi(wa(ph, ps), th)",
    "wi(ch, wi(th, ta))",
    "wi(ta, et)",
];

// Hypothesis steps h0..h5 listed in a shuffled order, and a qed that cites them in that order.
fn shuffled_session(seed: u64, hyps: &[&str]) -> (Session, Vec<usize>) {
    let mut order: Vec<usize> = (0..hyps.len()).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    order.shuffle(&mut rng);

    let mut steps = vec![];
    for i in &order {
        steps.push(format!(
            r#"{{"label": "h{}", "hyp": "bt.{}", "formula": "{}"}}"#,
            i,
            i + 1,
            hyps[*i]
        ));
    }
    let cited: Vec<String> = order.iter().map(|i| format!("\"h{}\"", i)).collect();
    steps.push(format!(
        r#"{{"label": "qed", "ref": "mp6", "hyps": [{}], "formula": "et"}}"#,
        cited.join(", ")
    ));
    let steps = format!("[{}]", steps.join(",\n"));
    (load(r#"{"label": "bt", "seq": 100}"#, &steps), order)
}

#[test]
fn test_shuffled_hyps_are_matched() {
    let n = MP6_HYPS.len();
    for seed in 0..12 {
        let (mut session, order) = shuffled_session(seed, &MP6_HYPS);
        let outcome = unify(&mut session);
        assert!(outcome.is_proved(), "seed {}: {:?}", seed, order);
        assert!(
            outcome.stats.pairwise_attempts <= n * n + n,
            "seed {} took {} attempts",
            seed,
            outcome.stats.pairwise_attempts
        );

        // The step's hyps end up in mp6's order.
        let ws = &session.worksheet;
        let qed = ws.qed().unwrap();
        let hyps: Vec<String> = ws
            .derivation(qed)
            .hyps
            .iter()
            .map(|h| ws.label(h.unwrap()).to_string())
            .collect();
        let expected: Vec<String> = (0..n).map(|i| format!("h{}", i)).collect();
        assert_eq!(hyps, expected, "seed {}", seed);
        assert!(rpn(&outcome).ends_with("bt.1 bt.2 bt.3 bt.4 bt.5 bt.6 mp6"));
    }
}

#[test]
fn test_failed_search_is_bounded() {
    // Nothing ends in et, so mp6's last hypothesis has no partner.
    let mut hyps = MP6_HYPS;
    hyps[5] = "wi(ta, ch)";
    let n = hyps.len();
    for seed in 0..6 {
        let (mut session, _) = shuffled_session(seed, &hyps);
        let outcome = unify(&mut session);
        assert_eq!(outcome.diagnostics.len(), 1);
        assert_eq!(outcome.diagnostics[0].code, ErrorCode::RefUnify);
        assert_eq!(status(&session, "qed"), UnificationStatus::UnificationError);
        assert!(outcome.stats.pairwise_attempts <= n * n + n);
    }
}
