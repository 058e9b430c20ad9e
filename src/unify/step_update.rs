use tracing::trace;

use crate::config::DjVarsSoftErrors;
use crate::error::ErrorCode;
use crate::kernel::atom::AssertionId;
use crate::kernel::term::Term;
use crate::unify::context::UnifyContext;
use crate::unify::dj_vars::{check_dj_vars, describe_soft};
use crate::unify::result::{AutoMatch, DjCheck, Unification};
use crate::worksheet::step::{DerivationStep, DjVarsStatus, Step, StepId, UnificationStatus};
use crate::worksheet::Worksheet;

pub fn check_step(ctx: &UnifyContext, assertion: AssertionId, subst: &[Option<Term>]) -> DjCheck {
    check_dj_vars(
        ctx.symbols,
        ctx.config.dj_vars_soft_errors,
        &ctx.dj_frame,
        ctx.catalog.get(assertion),
        subst,
    )
}

fn soft_message(ctx: &UnifyContext, assertion: AssertionId, check: &DjCheck) -> String {
    format!(
        "{} needs distinct variable restrictions the theorem lacks: {}",
        ctx.catalog.get(assertion).label,
        describe_soft(ctx.symbols, &check.soft)
    )
}

// Records a distinct variable check as the step's current one.
fn apply_dj_check(
    ctx: &UnifyContext,
    d: &mut DerivationStep,
    assertion: AssertionId,
    check: DjCheck,
) {
    match &check.hard {
        Some(message) => {
            d.dj_status = DjVarsStatus::Hard;
            d.held_dj_message = Some(message.clone());
        }
        None if check.soft.is_empty() => {
            d.dj_status = DjVarsStatus::None;
            d.held_dj_message = None;
        }
        None => {
            d.dj_status = DjVarsStatus::Soft;
            d.held_dj_message = if ctx.config.dj_vars_soft_errors == DjVarsSoftErrors::Report {
                Some(soft_message(ctx, assertion, &check))
            } else {
                None
            };
        }
    }
    d.soft_dj_errors = check.soft;
}

/// Checks the restrictions of the step's current Ref.
pub fn initial_dj_edits(ctx: &UnifyContext, ws: &mut Worksheet, id: StepId) {
    let d = ws.derivation(id);
    let Some(assertion) = d.reference else {
        return;
    };
    let check = check_step(ctx, assertion, &d.subst);
    apply_dj_check(ctx, ws.derivation_mut(id), assertion, check);
}

/// Unified, or unified with work variables if the step or one of its derivation hyps
/// still has some.
fn work_var_status(ws: &Worksheet, id: StepId) -> UnificationStatus {
    let d = ws.derivation(id);
    let pending = d.has_work_vars()
        || d.hyps.iter().flatten().any(|h| match ws.step(*h) {
            Step::Derivation(dh) => {
                dh.has_work_vars() || dh.status == UnificationStatus::UnifiedWithWorkVars
            }
            Step::Hypothesis(_) => false,
        });
    if pending {
        UnificationStatus::UnifiedWithWorkVars
    } else {
        UnificationStatus::Unified
    }
}

/// Records a successful unification on a step.
///
/// A step that is already unified keeps its Ref unless the new one fixes a distinct
/// variable problem. Otherwise the new assertion is noted as an alternate.
pub fn mark_step_unified(
    ctx: &mut UnifyContext,
    ws: &mut Worksheet,
    id: StepId,
    unification: Unification,
    with_work_vars: bool,
) {
    if ws.derivation(id).status.is_proper() {
        remark_step_unified(ctx, ws, id, unification);
        return;
    }
    trace!(
        step = ws.label(id),
        assertion = ctx.catalog.get(unification.assertion).label.as_str(),
        "unified"
    );

    let assertion = ctx.catalog.get(unification.assertion);
    let d = ws.derivation_mut(id);
    d.status = UnificationStatus::Unified;
    d.hyps = unification.rearrange(&d.hyps);
    if with_work_vars && d.formula.is_none() {
        let formula = assertion.instantiate(&assertion.formula, &unification.subst);
        d.formula_incomplete = formula.has_work_vars();
        d.set_formula(formula);
    }
    d.reference = Some(unification.assertion);
    d.subst = unification.subst.clone();
    d.auto_step = false;

    if with_work_vars {
        derive_hyps(ctx, ws, id, &unification);
        update_worksheet_work_vars(ctx, ws, id);
    }

    let mut status = work_var_status(ws, id);
    let hyps: Vec<StepId> = ws.derivation(id).hyps.iter().flatten().copied().collect();
    for h in hyps {
        let Step::Derivation(dh) = ws.step(h) else {
            continue;
        };
        if dh.hyps_incomplete() {
            let message = format!(
                "unified, but hyp {} still has hypotheses to derive",
                dh.label
            );
            ctx.report(ErrorCode::IncompleteHyps, ws.label(id), message);
            status = UnificationStatus::UnifiedWithIncompleteHyps;
            break;
        }
    }
    ws.derivation_mut(id).status = status;
    initial_dj_edits(ctx, ws, id);
}

// A step that is already unified found another assertion.
fn remark_step_unified(
    ctx: &mut UnifyContext,
    ws: &mut Worksheet,
    id: StepId,
    unification: Unification,
) {
    let Some(current) = ws.derivation(id).reference else {
        return;
    };
    if current == unification.assertion {
        return;
    }
    let check = check_step(ctx, unification.assertion, &unification.subst);
    let d = ws.derivation_mut(id);
    let replace = match d.dj_status {
        DjVarsStatus::None => false,
        DjVarsStatus::Hard => check.hard.is_none(),
        DjVarsStatus::Soft => check.is_clean(),
    };
    if !replace {
        d.add_alternate(unification.assertion);
        return;
    }

    trace!(step = d.label.as_str(), "replacing a Ref with distinct variable problems");
    d.add_alternate(current);
    d.hyps = unification.rearrange(&d.hyps);
    d.reference = Some(unification.assertion);
    d.subst = unification.subst;
    apply_dj_check(ctx, d, unification.assertion, check);
}

/// Fills an auto step's hyps with the chosen earlier steps and records the unification.
pub fn mark_auto_step_unified(
    ctx: &mut UnifyContext,
    ws: &mut Worksheet,
    id: StepId,
    found: AutoMatch,
) {
    ws.derivation_mut(id).hyps = found.hyps.iter().map(|h| Some(*h)).collect();
    let unification = Unification {
        assertion: found.assertion,
        subst: found.subst,
        order: None,
    };
    mark_step_unified(ctx, ws, id, unification, false);
}

// Gives every hyp to be derived a step, reusing an earlier step with the same formula.
fn derive_hyps(ctx: &UnifyContext, ws: &mut Worksheet, id: StepId, unification: &Unification) {
    let assertion = ctx.catalog.get(unification.assertion);
    let hyps = ws.derivation(id).hyps.clone();
    for (i, hyp) in hyps.iter().enumerate() {
        if hyp.is_some() {
            continue;
        }
        let formula = assertion.instantiate(&assertion.log_hyps[i], &unification.subst);
        let h = match ws.find_matching_step_formula(&formula, id) {
            Some(h) => h,
            None => {
                let h = ws.add_generated_step(formula, id);
                trace!(step = ws.label(h), "generated");
                h
            }
        };
        ws.set_hyp(id, i, h);
    }
}

/// Rewrites every step through the work variable bindings the last unification made.
/// Steps that lost their last work variable become plainly unified and get their
/// distinct variable restrictions checked again.
pub fn update_worksheet_work_vars(ctx: &UnifyContext, ws: &mut Worksheet, current: StepId) {
    for id in ws.derivation_ids() {
        let d = ws.derivation(id);
        if d.work_vars.iter().any(|w| !ctx.work_vars.is_allocated(*w)) {
            if let Some(formula) = &d.formula {
                let resolved = ctx.work_vars.resolve(formula);
                let d = ws.derivation_mut(id);
                d.set_formula(resolved);
                d.formula_incomplete = d.formula_incomplete && d.has_work_vars();
            }
        }
        if id == current {
            continue;
        }

        let d = ws.derivation_mut(id);
        for term in d.subst.iter_mut().flatten() {
            if term.has_work_vars() {
                *term = ctx.work_vars.resolve(term);
            }
        }
        let old = d.status;
        if !old.is_provable() {
            continue;
        }
        let new = work_var_status(ws, id);
        ws.derivation_mut(id).status = new;
        if new != old && new == UnificationStatus::Unified {
            initial_dj_edits(ctx, ws, id);
        }
    }
}

/// Weakens each provable step's status to match its hyps. Steps come in proof order,
/// so every hyp is settled before the steps that use it.
pub fn chain_statuses(ws: &mut Worksheet) {
    for id in ws.derivation_ids() {
        let d = ws.derivation(id);
        if !d.status.is_provable() {
            continue;
        }
        let mut status = d.status;
        for h in d.hyps.iter().flatten() {
            let Step::Derivation(dh) = ws.step(*h) else {
                continue;
            };
            let hyp_status = if dh.hyps_incomplete() || !dh.status.is_provable() {
                UnificationStatus::UnifiedWithIncompleteHyps
            } else if dh.has_work_vars() {
                UnificationStatus::UnifiedWithWorkVars
            } else {
                dh.status
            };
            status = status.combine(hyp_status);
        }
        ws.derivation_mut(id).status = status;
    }
}
