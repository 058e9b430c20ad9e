use crate::catalog::Assertion;
use crate::error::UnifyError;
use crate::kernel::atom::{Atom, WorkVarId};
use crate::kernel::term::Term;
use crate::worksheet::work_vars::WorkVarManager;

// What a deferred assignment binds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Binder {
    // A mandatory variable of the assertion, by slot.
    Slot(usize),

    WorkVar(WorkVarId),
}

/// An assignment found while walking two trees, applied once the whole level is walked.
#[derive(Clone, Debug)]
pub struct Deferred {
    binder: Binder,
    term: Term,

    // A work variable's term comes straight from the assertion until this is set,
    // so its variables still need to be replaced.
    generated: bool,
}

/// Unifies a step containing work variables with one assertion.
///
/// Unlike matching, both sides have placeholders: the assertion's mandatory variables
/// and the step's work variables. Variables are bound in `bindings`, work variables in
/// the manager. Level 0 is the formula and level i + 1 is hypothesis i. Every binding
/// and allocation is recorded against its level so a failed level can be backed out.
pub struct StepUnifier<'a> {
    assertion: &'a Assertion,
    bindings: Vec<Option<Term>>,
    applied: Vec<Vec<Binder>>,
    allocated: Vec<Vec<WorkVarId>>,
}

impl<'a> StepUnifier<'a> {
    pub fn new(assertion: &'a Assertion) -> StepUnifier<'a> {
        let levels = assertion.num_log_hyps() + 1;
        StepUnifier {
            assertion,
            bindings: vec![None; assertion.mand_vars.len()],
            applied: vec![vec![]; levels],
            allocated: vec![vec![]; levels],
        }
    }

    /// Walks an assertion tree and a step tree in parallel, collecting assignments.
    /// On the formula level an unbound variable is bound right away, since nothing else
    /// can have bound it yet. Elsewhere nothing is changed, so the result can be memoized.
    pub fn unify_level(
        &mut self,
        level: usize,
        target: &Term,
        source: &Term,
        deferred: &mut Vec<Deferred>,
    ) -> bool {
        if target.get_term_type() != source.get_term_type() {
            return false;
        }
        if let Some(v) = target.atomic_variable() {
            if let Some(slot) = self.assertion.slot_of_var(v) {
                if level == 0 && self.bindings[slot].is_none() {
                    self.bindings[slot] = Some(source.clone());
                    self.applied[0].push(Binder::Slot(slot));
                } else {
                    deferred.push(Deferred {
                        binder: Binder::Slot(slot),
                        term: source.clone(),
                        generated: true,
                    });
                }
                return true;
            }
        }
        if let Some(w) = source.atomic_work_var() {
            deferred.push(Deferred {
                binder: Binder::WorkVar(w),
                term: target.clone(),
                generated: false,
            });
            return true;
        }
        if target.get_head() != source.get_head() || target.args().len() != source.args().len() {
            return false;
        }
        for (t, s) in target.args().iter().zip(source.args()) {
            if !self.unify_level(level, t, s, deferred) {
                return false;
            }
        }
        true
    }

    /// Applies a level's deferred assignments. False on a conflict, in which case the
    /// caller backs the level out.
    pub fn merge_all(
        &mut self,
        manager: &mut WorkVarManager,
        level: usize,
        deferred: &[Deferred],
    ) -> Result<bool, UnifyError> {
        for d in deferred {
            if !self.merge(manager, level, d.binder, d.term.clone(), d.generated)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn merge(
        &mut self,
        manager: &mut WorkVarManager,
        level: usize,
        binder: Binder,
        term: Term,
        generated: bool,
    ) -> Result<bool, UnifyError> {
        let term = match binder {
            Binder::WorkVar(_) if !generated => self.import(manager, level, &term)?,
            _ => term,
        };
        match binder {
            Binder::Slot(slot) => match self.bindings[slot].clone() {
                None => {
                    self.bindings[slot] = Some(term);
                    self.applied[level].push(binder);
                    Ok(true)
                }
                Some(existing) => self.subunify(manager, level, &existing, &term),
            },
            Binder::WorkVar(w) => match manager.binding(w).cloned() {
                None => {
                    match occurs_check(manager, w, &term) {
                        Occurs::Same => return Ok(true),
                        Occurs::Cycle => return Ok(false),
                        Occurs::Clear => {}
                    }
                    manager.bind(w, term);
                    self.applied[level].push(binder);
                    Ok(true)
                }
                Some(existing) => self.subunify(manager, level, &existing, &term),
            },
        }
    }

    // Unifies two terms that are both in the step's vocabulary.
    fn subunify(
        &mut self,
        manager: &mut WorkVarManager,
        level: usize,
        t1: &Term,
        t2: &Term,
    ) -> Result<bool, UnifyError> {
        if t1.get_head() == t2.get_head() && t1.args().len() == t2.args().len() {
            for (a1, a2) in t1.args().iter().zip(t2.args()) {
                if !self.subunify(manager, level, a1, a2)? {
                    return Ok(false);
                }
            }
            return Ok(true);
        }
        if t1.get_term_type() != t2.get_term_type() {
            return Ok(false);
        }
        if let Some(w) = t1.atomic_work_var() {
            return self.merge(manager, level, Binder::WorkVar(w), t2.clone(), true);
        }
        if let Some(w) = t2.atomic_work_var() {
            return self.merge(manager, level, Binder::WorkVar(w), t1.clone(), true);
        }
        Ok(false)
    }

    // Brings an assertion subtree into the step's vocabulary by replacing its variables
    // with their bindings. An unbound variable gets a fresh work variable.
    fn import(
        &mut self,
        manager: &mut WorkVarManager,
        level: usize,
        term: &Term,
    ) -> Result<Term, UnifyError> {
        if let Some(v) = term.atomic_variable() {
            if let Some(slot) = self.assertion.slot_of_var(v) {
                if let Some(bound) = &self.bindings[slot] {
                    return Ok(bound.clone());
                }
                let w = manager.alloc(term.get_term_type())?;
                self.allocated[level].push(w);
                let fresh = Term::work_var(w);
                self.bindings[slot] = Some(fresh.clone());
                self.applied[level].push(Binder::Slot(slot));
                return Ok(fresh);
            }
        }
        if term.is_atomic() {
            return Ok(term.clone());
        }
        let mut args = Vec::with_capacity(term.args().len());
        for arg in term.args() {
            args.push(self.import(manager, level, arg)?);
        }
        Ok(Term::new(term.get_term_type(), *term.get_head(), args))
    }

    /// Gives every unbound variable a fresh work variable.
    pub fn alloc_unassigned(
        &mut self,
        manager: &mut WorkVarManager,
        level: usize,
    ) -> Result<(), UnifyError> {
        for slot in 0..self.bindings.len() {
            if self.bindings[slot].is_some() {
                continue;
            }
            let w = manager.alloc(self.assertion.var_types[slot])?;
            self.allocated[level].push(w);
            self.bindings[slot] = Some(Term::work_var(w));
            self.applied[level].push(Binder::Slot(slot));
        }
        Ok(())
    }

    /// Undoes every binding and allocation made at this level.
    pub fn backout(&mut self, manager: &mut WorkVarManager, level: usize) {
        for binder in self.applied[level].drain(..) {
            match binder {
                Binder::Slot(slot) => self.bindings[slot] = None,
                Binder::WorkVar(w) => manager.unbind(w),
            }
        }
        for w in self.allocated[level].drain(..) {
            manager.unbind(w);
            manager.dealloc(w);
        }
    }

    pub fn backout_all(&mut self, manager: &mut WorkVarManager) {
        for level in (0..self.applied.len()).rev() {
            self.backout(manager, level);
        }
    }

    /// Unifies the formula level. A step with no formula yet has it derived, so all the
    /// variables get fresh work variables.
    pub fn unify_formula(
        &mut self,
        manager: &mut WorkVarManager,
        formula: Option<&Term>,
    ) -> Result<bool, UnifyError> {
        let Some(formula) = formula else {
            self.alloc_unassigned(manager, 0)?;
            return Ok(true);
        };
        let assertion = self.assertion;
        let mut deferred = vec![];
        if !self.unify_level(0, &assertion.formula, formula, &mut deferred)
            || !self.merge_all(manager, 0, &deferred)?
        {
            self.backout(manager, 0);
            return Ok(false);
        }
        Ok(true)
    }

    /// Unifies hypothesis i with step hyp i for every i.
    /// On failure the hypothesis levels are backed out and the formula level is kept.
    pub fn unify_hyps_in_order(
        &mut self,
        manager: &mut WorkVarManager,
        hyps: &[Option<Term>],
    ) -> Result<bool, UnifyError> {
        let assertion = self.assertion;
        for (i, hyp) in hyps.iter().enumerate() {
            let Some(hyp) = hyp else {
                continue;
            };
            let level = i + 1;
            let mut deferred = vec![];
            if !self.unify_level(level, &assertion.log_hyps[i], hyp, &mut deferred)
                || !self.merge_all(manager, level, &deferred)?
            {
                for l in (1..=level).rev() {
                    self.backout(manager, l);
                }
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Searches for an assignment of step hyps to assertion hypotheses, easiest first.
    /// Returns order[i] = the step hyp assigned to hypothesis i.
    /// On failure the hypothesis levels are backed out and the formula level is kept.
    pub fn unify_hyps_sorted(
        &mut self,
        manager: &mut WorkVarManager,
        hyps: &[Option<Term>],
        step_sorted: &[usize],
    ) -> Result<Option<Vec<usize>>, UnifyError> {
        let assertion = self.assertion;
        let n = assertion.num_log_hyps();
        let sorted = &assertion.fingerprint.sorted_log_hyps;

        // memo[level][col]: None untried, Some(None) impossible, Some(Some(list)) the assignments.
        let mut memo: Vec<Vec<Option<Option<Vec<Deferred>>>>> = vec![vec![None; n]; n];
        let mut used = vec![false; n];
        let mut xref: Vec<Option<usize>> = vec![None; n];
        let mut impossible = vec![0; n];

        let mut level = 0;
        while level < n {
            let mut col = match xref[level].take() {
                Some(previous) => {
                    used[previous] = false;
                    previous + 1
                }
                None => 0,
            };
            let mut found = false;
            while col < n {
                let c = col;
                col += 1;
                if used[c] {
                    continue;
                }
                if memo[level][c].is_none() {
                    let list = match &hyps[step_sorted[level]] {
                        None => Some(vec![]),
                        Some(hyp) => {
                            let mut deferred = vec![];
                            if self.unify_level(
                                level + 1,
                                &assertion.log_hyps[sorted[c]],
                                hyp,
                                &mut deferred,
                            ) {
                                Some(deferred)
                            } else {
                                None
                            }
                        }
                    };
                    if list.is_none() {
                        impossible[level] += 1;
                    }
                    memo[level][c] = Some(list);
                }
                let Some(Some(list)) = &memo[level][c] else {
                    continue;
                };
                if self.merge_all(manager, level + 1, list)? {
                    xref[level] = Some(c);
                    used[c] = true;
                    found = true;
                    break;
                }
                self.backout(manager, level + 1);
            }

            if found {
                level += 1;
                continue;
            }
            if impossible[level] >= n || level == 0 {
                for l in (1..=n).rev() {
                    self.backout(manager, l);
                }
                return Ok(None);
            }
            level -= 1;
            self.backout(manager, level + 1);
        }

        let mut order = vec![0; n];
        for (level, col) in xref.iter().enumerate() {
            if let Some(c) = col {
                order[sorted[*c]] = step_sorted[level];
            }
        }
        Ok(Some(order))
    }

    /// Completes the unification. Unbound variables get fresh work variables and every
    /// bound work variable is resolved and released. Returns the substitution, parallel
    /// to the assertion's hypothesis array.
    pub fn finalize(
        &mut self,
        manager: &mut WorkVarManager,
    ) -> Result<Vec<Option<Term>>, UnifyError> {
        self.alloc_unassigned(manager, 0)?;
        manager.resolve_updates();
        let mut subst = vec![None; self.assertion.num_slots()];
        for (slot, binding) in self.bindings.iter().enumerate() {
            subst[slot] = binding.as_ref().map(|t| manager.resolve(t));
        }
        Ok(subst)
    }
}

enum Occurs {
    // The term is a chain of renamings leading back to the work variable itself.
    Same,

    // Binding would make the work variable contain itself.
    Cycle,

    Clear,
}

fn occurs_check(manager: &WorkVarManager, w: WorkVarId, term: &Term) -> Occurs {
    let mut current = term;
    while let Some(x) = current.atomic_work_var() {
        if x == w {
            return Occurs::Same;
        }
        match manager.binding(x) {
            Some(next) => current = next,
            None => return Occurs::Clear,
        }
    }
    if mentions(manager, current, w) {
        Occurs::Cycle
    } else {
        Occurs::Clear
    }
}

// Whether the term mentions the work variable, looking through bindings.
fn mentions(manager: &WorkVarManager, term: &Term, w: WorkVarId) -> bool {
    if let Atom::WorkVar(x) = term.get_head() {
        if *x == w {
            return true;
        }
        if let Some(bound) = manager.binding(*x) {
            return mentions(manager, bound, w);
        }
    }
    term.args().iter().any(|a| mentions(manager, a, w))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::symbol_table::SymbolTable;

    fn setup() -> (SymbolTable, Assertion, WorkVarManager) {
        let mut table = SymbolTable::new();
        let wff = table.add_type("wff", "&W").unwrap();
        table.add_syntax("wi", wff, vec![wff, wff]).unwrap();
        table.add_syntax("wn", wff, vec![wff]).unwrap();
        table.add_var("ph", wff).unwrap();
        table.add_var("ps", wff).unwrap();
        table.add_var("ch", wff).unwrap();
        let parse = |s: &str| Term::parse(s, &table).unwrap();
        let mp = Assertion::new(
            "ax-mp",
            1,
            vec![parse("ph"), parse("wi(ph, ps)")],
            parse("ps"),
            vec![],
        );
        let mut manager = WorkVarManager::new(&table, 10);
        for n in 1..=3 {
            manager.register(WorkVarId::new(wff, n)).unwrap();
        }
        (table, mp, manager)
    }

    #[test]
    fn test_work_var_gets_bound() {
        let (table, mp, mut manager) = setup();
        let parse = |s: &str| Term::parse(s, &table).unwrap();
        let mut unifier = StepUnifier::new(&mp);
        assert!(unifier
            .unify_formula(&mut manager, Some(&parse("wn(ch)")))
            .unwrap());
        let hyps = vec![Some(parse("&W1")), Some(parse("wi(wi(ph, ph), wn(ch))"))];
        assert!(unifier.unify_hyps_in_order(&mut manager, &hyps).unwrap());
        let subst = unifier.finalize(&mut manager).unwrap();
        assert_eq!(subst[0].as_ref().unwrap().display(&table).to_string(), "wi(ph, ph)");
        assert_eq!(subst[1].as_ref().unwrap().display(&table).to_string(), "wn(ch)");
        assert!(!manager.is_allocated(WorkVarId::new(0, 1)));
        let w1 = manager.resolve(&parse("&W1"));
        assert_eq!(w1.display(&table).to_string(), "wi(ph, ph)");
    }

    #[test]
    fn test_occurs_check_rejects_cycles() {
        let (table, mp, mut manager) = setup();
        let parse = |s: &str| Term::parse(s, &table).unwrap();
        let mut unifier = StepUnifier::new(&mp);
        assert!(unifier.unify_formula(&mut manager, Some(&parse("&W1"))).unwrap());
        let hyps = vec![Some(parse("&W2")), Some(parse("wi(&W2, wn(&W1))"))];
        assert!(!unifier.unify_hyps_in_order(&mut manager, &hyps).unwrap());
        assert!(manager.binding(WorkVarId::new(0, 2)).is_none());
    }

    #[test]
    fn test_backout_releases_fresh_work_vars() {
        let (_, mp, mut manager) = setup();
        let mut unifier = StepUnifier::new(&mp);
        assert!(unifier.unify_formula(&mut manager, None).unwrap());
        assert!(manager.is_allocated(WorkVarId::new(0, 4)));
        assert!(manager.is_allocated(WorkVarId::new(0, 5)));
        unifier.backout_all(&mut manager);
        assert!(!manager.is_allocated(WorkVarId::new(0, 4)));
        assert!(!manager.is_allocated(WorkVarId::new(0, 5)));
    }
}
