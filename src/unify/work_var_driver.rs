use tracing::trace;

use crate::error::{ErrorCode, UnifyError};
use crate::kernel::fingerprint::sort_by_complexity;
use crate::unify::context::UnifyContext;
use crate::unify::result::Unification;
use crate::unify::step_unifier::StepUnifier;
use crate::unify::step_update::mark_step_unified;
use crate::worksheet::step::{StepId, UnificationStatus};
use crate::worksheet::Worksheet;

/// Unifies a step that has a Ref and work variables, a formula to derive, or hyps to derive.
/// None if the Ref doesn't unify. On failure nothing the attempt bound is left behind.
pub fn unify_step_with_work_vars(
    ctx: &mut UnifyContext,
    ws: &Worksheet,
    id: StepId,
) -> Result<Option<Unification>, UnifyError> {
    let d = ws.derivation(id);
    let Some(assertion_id) = d.reference else {
        return Ok(None);
    };
    let catalog = ctx.catalog;
    let assertion = catalog.get(assertion_id);
    let hyps = ws.hyp_formulas(id);
    let manager = &mut ctx.work_vars;
    let mut unifier = StepUnifier::new(assertion);

    if !unifier.unify_formula(manager, d.formula.as_ref())? {
        return Ok(None);
    }

    let mut order = None;
    if !hyps.is_empty() && !unifier.unify_hyps_in_order(manager, &hyps)? {
        let step_sorted = sort_by_complexity(hyps.iter().map(|h| h.as_ref()), d.formula.as_ref());
        match unifier.unify_hyps_sorted(manager, &hyps, &step_sorted)? {
            Some(found) => order = Some(found),
            None => {
                unifier.backout_all(manager);
                return Ok(None);
            }
        }
    }

    let subst = unifier.finalize(manager)?;
    Ok(Some(Unification {
        assertion: assertion_id,
        subst,
        order,
    }))
}

/// The first pass: every step with a Ref that involves work variables or has something
/// to derive. Steps generated along the way are inserted before the current step and
/// are not visited.
pub fn unify_steps_involving_work_vars(
    ctx: &mut UnifyContext,
    ws: &mut Worksheet,
) -> Result<(), UnifyError> {
    let mut i = 0;
    while i < ws.order().len() {
        let id = ws.order()[i];
        i += 1;
        if !ws.is_derivation(id) {
            continue;
        }
        let d = ws.derivation(id);
        let Some(assertion_id) = d.reference else {
            continue;
        };
        if !(d.formula.is_none()
            || d.hyps_incomplete()
            || ws.has_work_vars_in_step_or_hyps(id))
        {
            continue;
        }
        let assertion = ctx.catalog.get(assertion_id);
        if d.hyps.len() != assertion.num_log_hyps() {
            panic!(
                "step {} has {} hyps but {} has {}",
                d.label,
                d.hyps.len(),
                assertion.label,
                assertion.num_log_hyps()
            );
        }
        let cancelled = d
            .hyps
            .iter()
            .flatten()
            .any(|h| ws.formula(*h).is_none());
        if cancelled {
            ws.derivation_mut(id).status = UnificationStatus::AttemptCancelled;
            continue;
        }

        match unify_step_with_work_vars(ctx, ws, id)? {
            Some(unification) => {
                mark_step_unified(ctx, ws, id, unification, true);
                // Skip over whatever was generated in front of this step.
                i = ws.position(id).map(|p| p + 1).unwrap_or(i);
            }
            None => {
                trace!(step = ws.label(id), "Ref does not unify");
                let message = format!(
                    "{} does not unify with the step",
                    ctx.catalog.get(assertion_id).label
                );
                ctx.report(ErrorCode::RefUnify, ws.label(id), message);
                ws.derivation_mut(id).status = UnificationStatus::UnificationError;
            }
        }
    }
    Ok(())
}
