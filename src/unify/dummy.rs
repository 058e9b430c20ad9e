use std::collections::HashSet;

use tracing::debug;

use crate::error::UnifyError;
use crate::kernel::atom::{TypeId, VarId, WorkVarId};
use crate::kernel::term::Term;
use crate::unify::context::UnifyContext;
use crate::unify::step_update::initial_dj_edits;
use crate::worksheet::step::{Step, StepId, UnificationStatus};
use crate::worksheet::Worksheet;

/// Replaces the work variables left under the qed step with optional variables the
/// theorem doesn't use.
///
/// Work variables that appear together in a step or its hyps are grouped. Within a group
/// every work variable needs its own variable, but different groups can reuse the same
/// variables.
pub fn convert_work_vars_to_dummies(
    ctx: &mut UnifyContext,
    ws: &mut Worksheet,
    qed: StepId,
) -> Result<(), UnifyError> {
    let mut mandatory: Vec<VarId> = vec![];
    if let Some(formula) = ws.formula(qed) {
        formula.collect_vars(&mut mandatory);
    }
    for id in ws.order() {
        if let Step::Hypothesis(h) = ws.step(*id) {
            h.formula.collect_vars(&mut mandatory);
        }
    }
    let optional: Vec<VarId> = ws
        .theorem
        .vars
        .iter()
        .copied()
        .filter(|v| !mandatory.contains(v))
        .collect();

    let mut in_use: Vec<VarId> = vec![];
    let mut classes: Vec<Vec<WorkVarId>> = vec![];
    let mut visited = HashSet::new();
    collect_classes(ws, qed, qed, &optional, &mut in_use, &mut classes, &mut visited);
    let classes = merge_overlapping(classes);

    // Unused optional variables by type, types in order of first appearance.
    let mut unused: Vec<(TypeId, Vec<VarId>)> = vec![];
    let mut sorted_optional = optional.clone();
    sorted_optional.sort_unstable();
    for v in sorted_optional {
        if in_use.contains(&v) {
            continue;
        }
        let typ = ctx.symbols.var_type(v);
        match unused.iter_mut().find(|(t, _)| *t == typ) {
            Some((_, vars)) => vars.push(v),
            None => unused.push((typ, vec![v])),
        }
    }

    for class in &classes {
        for (typ, vars) in &unused {
            let mut next = 0;
            for w in class.iter().filter(|w| w.typ == *typ) {
                let Some(v) = vars.get(next) else {
                    return Err(UnifyError::DummyVarShortage {
                        theorem: ws.theorem.label.clone(),
                        type_name: ctx.symbols.type_name(*typ).to_string(),
                        available: vars.len(),
                    });
                };
                next += 1;
                ctx.work_vars.bind(*w, Term::var(*typ, *v));
                ctx.stats.work_vars_converted += 1;
            }
        }
        // A type with no unused optional variables at all.
        if let Some(w) = class
            .iter()
            .find(|w| !unused.iter().any(|(t, _)| *t == w.typ))
        {
            return Err(UnifyError::DummyVarShortage {
                theorem: ws.theorem.label.clone(),
                type_name: ctx.symbols.type_name(w.typ).to_string(),
                available: 0,
            });
        }
    }
    debug!(classes = classes.len(), "converting work variables");

    let mut visited = HashSet::new();
    convert_step(ctx, ws, qed, &mut visited);
    Ok(())
}

// Walks the qed step's subtree, hyps first, grouping the work variables of each step
// with those of its hyps and noting which optional variables already appear.
fn collect_classes(
    ws: &Worksheet,
    qed: StepId,
    id: StepId,
    optional: &[VarId],
    in_use: &mut Vec<VarId>,
    classes: &mut Vec<Vec<WorkVarId>>,
    visited: &mut HashSet<StepId>,
) {
    if !visited.insert(id) {
        return;
    }
    let Step::Derivation(d) = ws.step(id) else {
        return;
    };
    for h in d.hyps.iter().flatten() {
        collect_classes(ws, qed, *h, optional, in_use, classes, visited);
    }

    if id != qed {
        if let Some(formula) = &d.formula {
            for v in formula.vars() {
                if optional.contains(&v) && !in_use.contains(&v) {
                    in_use.push(v);
                }
            }
        }
    }

    let mut group = d.work_vars.clone();
    for h in d.hyps.iter().flatten() {
        for w in ws.step(*h).work_vars() {
            if !group.contains(w) {
                group.push(*w);
            }
        }
    }
    if group.is_empty() {
        return;
    }
    match classes
        .iter_mut()
        .find(|class| group.iter().any(|w| class.contains(w)))
    {
        Some(class) => {
            for w in group {
                if !class.contains(&w) {
                    class.push(w);
                }
            }
        }
        None => classes.push(group),
    }
}

/// Merges classes that share a work variable until all of them are disjoint.
/// Each class comes back sorted, which is the order its work variables get dummies.
fn merge_overlapping(mut classes: Vec<Vec<WorkVarId>>) -> Vec<Vec<WorkVarId>> {
    loop {
        let mut merged = false;
        'outer: for i in 0..classes.len() {
            for j in (i + 1)..classes.len() {
                if classes[j].iter().any(|w| classes[i].contains(w)) {
                    let absorbed = classes.remove(j);
                    for w in absorbed {
                        if !classes[i].contains(&w) {
                            classes[i].push(w);
                        }
                    }
                    merged = true;
                    break 'outer;
                }
            }
        }
        if !merged {
            for class in classes.iter_mut() {
                class.sort_unstable();
            }
            return classes;
        }
    }
}

// Rewrites a step and its hyps through the dummy bindings, hyps first.
fn convert_step(
    ctx: &UnifyContext,
    ws: &mut Worksheet,
    id: StepId,
    visited: &mut HashSet<StepId>,
) {
    if !visited.insert(id) {
        return;
    }
    let Step::Derivation(d) = ws.step(id) else {
        return;
    };
    let mut redo_dj = false;
    let hyps: Vec<StepId> = d.hyps.iter().flatten().copied().collect();
    for h in hyps {
        if ws.is_derivation(h) && ws.derivation(h).has_work_vars() {
            redo_dj = true;
        }
        convert_step(ctx, ws, h, visited);
    }

    let d = ws.derivation_mut(id);
    if d.has_work_vars() {
        redo_dj = true;
        if let Some(formula) = &d.formula {
            let resolved = ctx.work_vars.resolve(formula);
            d.set_formula(resolved);
            d.formula_incomplete = false;
        }
    }
    for term in d.subst.iter_mut().flatten() {
        if term.has_work_vars() {
            *term = ctx.work_vars.resolve(term);
        }
    }
    if d.status == UnificationStatus::UnifiedWithWorkVars {
        d.status = UnificationStatus::Unified;
    }
    if redo_dj {
        initial_dj_edits(ctx, ws, id);
    }
}
