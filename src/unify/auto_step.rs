use tracing::{debug, trace};

use crate::catalog::Assertion;
use crate::config::DjVarsSoftErrors;
use crate::error::ErrorCode;
use crate::kernel::atom::AssertionId;
use crate::kernel::term::Term;
use crate::kernel::variable_map::SubstTable;
use crate::unify::context::{StepTarget, UnifyContext};
use crate::unify::dj_vars::describe_soft;
use crate::unify::pairwise::{match_formula, unify_hyp};
use crate::unify::result::{AutoMatch, UnifyResult};
use crate::unify::step_update::{check_step, mark_auto_step_unified};
use crate::worksheet::step::StepId;
use crate::worksheet::Worksheet;

/// An auto step whose formula already appears earlier is replaced by that step.
/// Returns the auto steps that still need unification.
pub fn replace_duplicates(ws: &mut Worksheet, auto_steps: Vec<StepId>) -> Vec<StepId> {
    let qed = ws.qed();
    let mut remaining = vec![];
    for id in auto_steps {
        let duplicate = match &ws.derivation(id).formula {
            Some(formula) if Some(id) != qed => ws.find_matching_step_formula(formula, id),
            _ => None,
        };
        match duplicate {
            Some(earlier) => {
                trace!(step = ws.label(id), earlier = ws.label(earlier), "duplicate auto step");
                ws.derivation_mut(id).local_ref = Some(earlier);
            }
            None => remaining.push(id),
        }
    }
    remaining
}

/// Tries to justify an auto step with an assertion, choosing its hyps among the
/// earlier steps.
pub fn autocomplete(
    ctx: &mut UnifyContext,
    ws: &Worksheet,
    target: &StepTarget,
    id: AssertionId,
) -> UnifyResult {
    let catalog = ctx.catalog;
    let assertion = catalog.get(id);
    let Some(fragment) = match_formula(&mut ctx.stats, target, assertion) else {
        return UnifyResult::Impossible;
    };
    let mut candidates: Vec<(StepId, Term)> = vec![];
    for step in ws.order() {
        if *step == target.step {
            break;
        }
        if let Some(formula) = ws.formula(*step) {
            candidates.push((*step, formula.clone()));
        }
    }

    let mut search = AutoSearch {
        ctx,
        target,
        id,
        assertion,
        candidates,
        subst: SubstTable::with_fragment(assertion.num_slots(), &fragment),
        chosen: vec![StepId(0); assertion.num_log_hyps()],
    };
    search.fill(0)
}

// Fills assertion hypotheses one at a time, in sorted order, with earlier steps.
struct AutoSearch<'a, 'b> {
    ctx: &'b mut UnifyContext<'a>,
    target: &'b StepTarget,
    id: AssertionId,
    assertion: &'a Assertion,
    candidates: Vec<(StepId, Term)>,
    subst: SubstTable,

    // The step chosen for each sorted hypothesis position.
    chosen: Vec<StepId>,
}

impl AutoSearch<'_, '_> {
    fn fill(&mut self, level: usize) -> UnifyResult {
        if level == self.chosen.len() {
            return self.complete();
        }
        let assertion = self.assertion;
        let hyp = &assertion.log_hyps[assertion.fingerprint.sorted_log_hyps[level]];
        let mut best = UnifyResult::Impossible;
        for c in 0..self.candidates.len() {
            let (step, formula) = &self.candidates[c];
            let step = *step;
            let Some(f) = unify_hyp(&mut self.ctx.stats, assertion, hyp, Some(formula))
            else {
                continue;
            };
            if !self.subst.merge(level, &f) {
                continue;
            }
            self.chosen[level] = step;
            match self.fill(level + 1) {
                UnifyResult::Proper(found) => return UnifyResult::Proper(found),
                UnifyResult::Possible(found) => {
                    best = best.better(UnifyResult::Possible(found));
                }
                UnifyResult::Impossible => {}
            }
            self.subst.undo_level(level);
        }
        best
    }

    fn complete(&self) -> UnifyResult {
        let check = check_step(self.ctx, self.id, self.subst.slots());
        if check.hard.is_some() {
            return UnifyResult::Impossible;
        }
        let reverse = &self.assertion.fingerprint.sorted_reverse;
        let found = AutoMatch {
            assertion: self.id,
            subst: self.subst.slots().to_vec(),
            hyps: (0..self.chosen.len())
                .map(|i| self.chosen[reverse[i]])
                .collect(),
            soft: check.soft,
        };
        trace!(
            step = self.target.label.as_str(),
            assertion = self.assertion.label.as_str(),
            soft = found.soft.len(),
            "autocompleted"
        );
        if found.soft.is_empty() {
            UnifyResult::Proper(found)
        } else {
            UnifyResult::Possible(found)
        }
    }
}

/// Unifies the auto steps, which have no Ref. Each takes the first assertion that
/// completes it cleanly, or failing that the possible completion needing the fewest
/// new restrictions.
pub fn unify_auto_steps(ctx: &mut UnifyContext, ws: &mut Worksheet, auto_steps: Vec<StepId>) {
    let mut pending = auto_steps;
    let mut best: Vec<(StepId, UnifyResult)> = vec![];
    let search_list = ctx.search_list.clone();

    for assertion_id in search_list {
        if pending.is_empty() {
            break;
        }
        let mut done = vec![];
        for id in pending.iter().copied() {
            let target = StepTarget::new(ws, id);
            match autocomplete(ctx, ws, &target, assertion_id) {
                UnifyResult::Proper(found) => {
                    mark_auto_step_unified(ctx, ws, id, found);
                    done.push(id);
                }
                possible @ UnifyResult::Possible(_) => {
                    match best.iter_mut().find(|(step, _)| *step == id) {
                        Some((_, previous)) => {
                            let old = std::mem::replace(previous, UnifyResult::Impossible);
                            *previous = old.better(possible);
                        }
                        None => best.push((id, possible)),
                    }
                }
                UnifyResult::Impossible => {}
            }
        }
        pending.retain(|id| !done.contains(id));
    }

    for (id, result) in best {
        if !pending.contains(&id) {
            continue;
        }
        let UnifyResult::Possible(found) = result else {
            continue;
        };
        if ctx.config.dj_vars_soft_errors == DjVarsSoftErrors::Report {
            let message = format!(
                "{} would complete the step with {}",
                ctx.catalog.get(found.assertion).label,
                describe_soft(ctx.symbols, &found.soft)
            );
            ctx.report(ErrorCode::PossibleSubst, ws.label(id), message);
        } else {
            debug!(step = ws.label(id), "completing with new restrictions");
            mark_auto_step_unified(ctx, ws, id, found);
        }
    }
}
