use tracing::{debug, trace};

use crate::checker::Checker;
use crate::config::DjVarsSoftErrors;
use crate::error::ErrorCode;
use crate::kernel::proof_tree::ProofNode;
use crate::unify::context::UnifyContext;
use crate::worksheet::step::{DjVarsStatus, Step, StepId, UnificationStatus};
use crate::worksheet::Worksheet;

/// Builds proof trees for every provable step, in proof order, and reports the distinct
/// variable errors of the Refs that were kept. Returns whether any step has a hard error.
pub fn build_proofs(ctx: &mut UnifyContext, ws: &mut Worksheet) -> bool {
    let mut hard = false;
    for id in ws.derivation_ids() {
        if ws.derivation(id).dj_status == DjVarsStatus::Hard {
            hard = true;
        }
        if ws.derivation(id).status.is_provable() {
            attempt_proof(ctx, ws, id);
        }

        let d = ws.derivation(id);
        if d.dj_status == DjVarsStatus::Soft && !d.soft_dj_errors.is_empty() {
            ctx.soft_dj_lists.push(d.soft_dj_errors.clone());
        }
        let reported = match d.dj_status {
            DjVarsStatus::Hard => true,
            DjVarsStatus::Soft => ctx.config.dj_vars_soft_errors == DjVarsSoftErrors::Report,
            DjVarsStatus::None => false,
        };
        if !reported {
            continue;
        }
        if let Some(message) = d.held_dj_message.clone() {
            ctx.report(ErrorCode::DjVarsVerify, &d.label, message);
        }
        report_alternates_of(ctx, ws, id);
    }
    hard
}

fn report_alternates_of(ctx: &mut UnifyContext, ws: &Worksheet, id: StepId) {
    let d = ws.derivation(id);
    if d.alternates.is_empty() {
        return;
    }
    let labels: Vec<&str> = d
        .alternates
        .iter()
        .map(|a| ctx.catalog.get(*a).label.as_str())
        .collect();
    let message = format!("other assertions also unify: {}", labels.join(", "));
    ctx.report(ErrorCode::AlternateRefs, &d.label, message);
}

/// Reports alternates for steps whose Ref has no distinct variable problems.
pub fn report_alternates(ctx: &mut UnifyContext, ws: &Worksheet) {
    for id in ws.derivation_ids() {
        if ws.derivation(id).dj_status == DjVarsStatus::None {
            report_alternates_of(ctx, ws, id);
        }
    }
}

// Assembles the step's proof from its Ref, its substitution and the proofs of its hyps.
fn attempt_proof(ctx: &mut UnifyContext, ws: &mut Worksheet, id: StepId) {
    let d = ws.derivation(id);
    let Some(assertion_id) = d.reference else {
        return;
    };
    let assertion = ctx.catalog.get(assertion_id);
    let mut children: Vec<Option<ProofNode>> = d
        .subst
        .iter()
        .map(|s| s.clone().map(ProofNode::Syntax))
        .collect();
    children.resize(assertion.num_slots(), None);

    let mut status = d.status;
    let mut slot = 0;
    for (i, hyp) in d.hyps.iter().enumerate() {
        let Some(h) = hyp else {
            ws.derivation_mut(id).status = UnificationStatus::UnifiedWithIncompleteHyps;
            return;
        };
        let node = match ws.step(*h) {
            Step::Hypothesis(hs) => ProofNode::Hyp {
                // A new theorem's hypotheses have no labels yet, so the step label stands in.
                label: hs.hyp_label.clone().unwrap_or_else(|| hs.label.clone()),
                formula: hs.formula.clone(),
            },
            Step::Derivation(dh) => match &dh.proof {
                Some(proof) => {
                    if dh.status == UnificationStatus::UnifiedWithWorkVars {
                        status = UnificationStatus::UnifiedWithWorkVars;
                    }
                    proof.clone()
                }
                None => {
                    trace!(step = d.label.as_str(), hyp = dh.label.as_str(), "hyp has no proof");
                    ws.derivation_mut(id).status = UnificationStatus::UnifiedWithIncompleteHyps;
                    return;
                }
            },
        };
        while slot < children.len() && children[slot].is_some() {
            slot += 1;
        }
        if slot == children.len() {
            panic!("no empty hypothesis slot for hyp {} of step {}", i + 1, d.label);
        }
        children[slot] = Some(node);
    }

    let children: Vec<ProofNode> = children
        .into_iter()
        .enumerate()
        .map(|(slot, child)| match child {
            Some(child) => child,
            None => panic!("slot {} of step {} has no substitution", slot, d.label),
        })
        .collect();
    let proof = ProofNode::Apply {
        assertion: assertion_id,
        children,
    };

    let mut verify_error = false;
    if ctx.config.recheck_proofs {
        if let Some(formula) = &d.formula {
            if let Err(message) = Checker::new(ctx.catalog, ctx.symbols).check(&proof, formula) {
                debug!(step = d.label.as_str(), message = message.as_str(), "recheck failed");
                let label = d.label.clone();
                ctx.report(ErrorCode::VerifyRecheck, &label, message);
                verify_error = true;
            }
        }
    }

    ctx.stats.proofs_built += 1;
    let d = ws.derivation_mut(id);
    d.status = status;
    d.proof = Some(proof);
    d.verify_error = verify_error;
}
