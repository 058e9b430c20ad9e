use serde::Serialize;
use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::config::UnifierConfig;
use crate::error::{Diagnostic, ErrorCode, UnifyError};
use crate::kernel::atom::DjPair;
use crate::kernel::proof_tree::{ProofNode, RpnLabel};
use crate::kernel::symbol_table::SymbolTable;
use crate::unify::auto_step::{replace_duplicates, unify_auto_steps};
use crate::unify::context::{StepTarget, UnifyContext, UnifyStats};
use crate::unify::dj_vars::dj_vars_to_declare;
use crate::unify::driver::unify_step_without_work_vars;
use crate::unify::dummy::convert_work_vars_to_dummies;
use crate::unify::proof_builder::{build_proofs, report_alternates};
use crate::unify::step_update::{chain_statuses, mark_step_unified};
use crate::unify::work_var_driver::unify_steps_involving_work_vars;
use crate::worksheet::step::{DjVarsStatus, StepId, UnificationStatus};
use crate::worksheet::Worksheet;

/// What a pass produced, besides the updates to the worksheet.
#[derive(Clone, Debug, Serialize)]
pub struct UnifyOutcome {
    pub diagnostics: Vec<Diagnostic>,

    /// The proof of the qed step, if it got one.
    #[serde(skip)]
    pub qed_proof: Option<ProofNode>,

    /// The qed proof in reverse Polish notation, with labels spelled out.
    pub qed_rpn: Option<Vec<String>>,

    /// The distinct variable restrictions the theorem should declare.
    pub dj_vars_to_declare: Vec<DjPair>,

    pub stats: UnifyStats,
}

impl UnifyOutcome {
    pub fn is_proved(&self) -> bool {
        self.qed_proof.is_some() && !self.diagnostics.iter().any(|d| d.code.is_error())
    }
}

/// Unifies every step of a worksheet against a catalog of assertions.
///
/// A pass runs in stages. Steps with a Ref and work variables come first, since they can
/// generate new steps. Then the remaining steps with a Ref, then steps without one, which
/// search the catalog. Auto steps search for their hyps too. Finally proofs are assembled
/// bottom-up and checked.
pub struct ProofUnifier<'a> {
    catalog: &'a Catalog,
    symbols: &'a SymbolTable,
    config: &'a UnifierConfig,
}

impl<'a> ProofUnifier<'a> {
    pub fn new(
        catalog: &'a Catalog,
        symbols: &'a SymbolTable,
        config: &'a UnifierConfig,
    ) -> ProofUnifier<'a> {
        ProofUnifier {
            catalog,
            symbols,
            config,
        }
    }

    /// Runs a full pass. Problems with individual steps are reported as diagnostics and
    /// recorded in step statuses. Only problems that make the whole pass meaningless are
    /// returned as errors.
    pub fn unify_all(&self, ws: &mut Worksheet) -> Result<UnifyOutcome, UnifyError> {
        let mut ctx = UnifyContext::new(self.catalog, self.symbols, self.config, ws);
        register_work_vars(&mut ctx, ws)?;

        unify_steps_involving_work_vars(&mut ctx, ws)?;
        let (empty_ref, auto) = unify_steps_having_refs(&mut ctx, ws);
        unify_steps_without_refs(&mut ctx, ws, empty_ref);
        let auto = replace_duplicates(ws, auto);
        unify_auto_steps(&mut ctx, ws, auto);
        ws.apply_local_refs();

        let Some(qed) = ws.qed() else {
            return Ok(self.outcome(ctx, ws, None));
        };
        let qed_status = ws.derivation(qed).status;
        if qed_status.is_proper() {
            chain_statuses(ws);
        }
        if ws.derivation(qed).status == UnificationStatus::UnifiedWithWorkVars {
            if !self.config.convert_work_vars {
                if let Some(first) = first_work_var_step(ws, qed) {
                    let label = ws.label(first).to_string();
                    ctx.report(
                        ErrorCode::NoConvertWorkVars,
                        &label,
                        "work variables remain and converting them is disabled".to_string(),
                    );
                }
                report_unification_failures(&mut ctx, ws, qed);
                return Ok(self.outcome(ctx, ws, Some(qed)));
            }
            convert_work_vars_to_dummies(&mut ctx, ws, qed)?;
        }

        let hard = build_proofs(&mut ctx, ws);
        if ws.derivation(qed).proof.is_none() || hard {
            report_alternates(&mut ctx, ws);
        }
        report_unification_failures(&mut ctx, ws, qed);
        Ok(self.outcome(ctx, ws, Some(qed)))
    }

    fn outcome(&self, ctx: UnifyContext, ws: &Worksheet, qed: Option<StepId>) -> UnifyOutcome {
        let qed_proof = qed.and_then(|q| ws.derivation(q).proof.clone());
        let qed_rpn = qed_proof
            .as_ref()
            .map(|proof| rpn_labels(self.catalog, self.symbols, proof));
        let dj_vars_to_declare = dj_vars_to_declare(
            self.config.dj_vars_soft_errors,
            &ws.theorem.dj,
            &ctx.soft_dj_lists,
        );
        info!(
            theorem = ws.theorem.label.as_str(),
            proved = qed_proof.is_some(),
            diagnostics = ctx.diagnostics.len(),
            "unification finished"
        );
        UnifyOutcome {
            diagnostics: ctx.diagnostics,
            qed_proof,
            qed_rpn,
            dj_vars_to_declare,
            stats: ctx.stats,
        }
    }
}

/// Spells out a proof's labels.
pub fn rpn_labels(catalog: &Catalog, symbols: &SymbolTable, proof: &ProofNode) -> Vec<String> {
    proof
        .to_rpn()
        .into_iter()
        .map(|label| match label {
            RpnLabel::Syntax(s) => symbols.syntax(s).label.clone(),
            RpnLabel::Var(v) => symbols.var(v).name.clone(),
            RpnLabel::WorkVar(w) => symbols.work_var_name(w),
            RpnLabel::Assertion(a) => catalog.get(a).label.clone(),
            RpnLabel::Hyp(label) => label,
        })
        .collect()
}

// Marks the work variables the worksheet already uses so they aren't handed out again.
fn register_work_vars(ctx: &mut UnifyContext, ws: &Worksheet) -> Result<(), UnifyError> {
    for id in ws.derivation_ids() {
        for w in &ws.derivation(id).work_vars {
            if ctx.work_vars.register(*w).is_err() {
                return Err(UnifyError::WorkVarsExhausted {
                    type_name: ctx.symbols.type_name(w.typ).to_string(),
                    limit: ctx.config.work_var_limit,
                });
            }
        }
    }
    Ok(())
}

// Unifies the steps with a Ref that the work variable pass left alone.
// Returns the steps that still need a search, and the auto steps.
fn unify_steps_having_refs(
    ctx: &mut UnifyContext,
    ws: &mut Worksheet,
) -> (Vec<StepId>, Vec<StepId>) {
    let mut empty_ref = vec![];
    let mut auto = vec![];
    for id in ws.derivation_ids() {
        let d = ws.derivation(id);
        if d.hyps_incomplete() || d.status != UnificationStatus::NotUnified {
            continue;
        }
        if d.reference.is_none() && ws.has_work_vars_in_step_or_hyps(id) {
            continue;
        }
        if d.hyps.iter().flatten().any(|h| ws.formula(*h).is_none()) {
            ws.derivation_mut(id).status = UnificationStatus::AttemptCancelled;
            continue;
        }
        let Some(assertion_id) = d.reference else {
            if d.auto_step {
                auto.push(id);
            } else {
                empty_ref.push(id);
            }
            continue;
        };

        let catalog = ctx.catalog;
        let assertion = catalog.get(assertion_id);
        if d.hyps.len() != assertion.num_log_hyps() {
            panic!(
                "step {} has {} hyps but {} has {}",
                d.label,
                d.hyps.len(),
                assertion.label,
                assertion.num_log_hyps()
            );
        }
        let target = StepTarget::new(ws, id);
        match unify_step_without_work_vars(&mut ctx.stats, &target, assertion_id, assertion) {
            Some(unification) => {
                mark_step_unified(ctx, ws, id, unification, false);
                if ws.derivation(id).dj_status != DjVarsStatus::None {
                    // Maybe another assertion does better.
                    empty_ref.push(id);
                }
            }
            None => {
                let message = format!("{} does not unify with the step", assertion.label);
                ctx.report(ErrorCode::RefUnify, &target.label, message);
                ws.derivation_mut(id).status = UnificationStatus::UnificationError;
            }
        }
    }
    (empty_ref, auto)
}

// Searches the catalog for the steps without a usable Ref.
fn unify_steps_without_refs(ctx: &mut UnifyContext, ws: &mut Worksheet, steps: Vec<StepId>) {
    let mut pending = steps;
    let catalog = ctx.catalog;
    let search_list = ctx.search_list.clone();
    for assertion_id in search_list {
        if pending.is_empty() {
            break;
        }
        let assertion = catalog.get(assertion_id);
        let mut done = vec![];
        for id in pending.iter().copied() {
            if ws.derivation(id).hyps.len() != assertion.num_log_hyps() {
                continue;
            }
            let target = StepTarget::new(ws, id);
            let Some(unification) =
                unify_step_without_work_vars(&mut ctx.stats, &target, assertion_id, assertion)
            else {
                continue;
            };
            mark_step_unified(ctx, ws, id, unification, false);
            if ws.derivation(id).dj_status == DjVarsStatus::None {
                done.push(id);
            }
        }
        pending.retain(|id| !done.contains(id));
    }
    debug!(unresolved = pending.len(), "finished searching");
}

// The first step under the qed, hyps first, that has work variables.
fn first_work_var_step(ws: &Worksheet, id: StepId) -> Option<StepId> {
    if !ws.is_derivation(id) {
        return None;
    }
    let d = ws.derivation(id);
    for h in d.hyps.iter().flatten() {
        if let Some(found) = first_work_var_step(ws, *h) {
            return Some(found);
        }
    }
    if d.has_work_vars() {
        Some(id)
    } else {
        None
    }
}

/// Reports each step the qed step depends on that ended up without a Ref.
fn report_unification_failures(ctx: &mut UnifyContext, ws: &Worksheet, qed: StepId) {
    let mut stack = vec![qed];
    let mut seen = vec![];
    let mut failed = vec![];
    while let Some(id) = stack.pop() {
        if seen.contains(&id) || !ws.is_derivation(id) {
            continue;
        }
        seen.push(id);
        let d = ws.derivation(id);
        if d.reference.is_none() {
            failed.push(id);
        }
        stack.extend(d.hyps.iter().flatten().copied());
    }
    // Report in proof order.
    for id in ws.order() {
        if failed.contains(id) {
            ctx.report(
                ErrorCode::StepUnify,
                ws.label(*id),
                "no assertion unifies with the step".to_string(),
            );
        }
    }
}
