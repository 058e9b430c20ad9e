pub mod step;
pub mod work_vars;

use std::collections::HashMap;

use crate::catalog::Catalog;
use crate::kernel::atom::{DjPair, VarId};
use crate::kernel::term::Term;
use step::{DerivationStep, HypothesisStep, Step, StepId};

/// The theorem a worksheet proves.
#[derive(Clone, Debug)]
pub struct Theorem {
    pub label: String,

    /// Only assertions with a smaller sequence number may be used.
    pub seq: u32,

    /// A new theorem is not in the catalog yet.
    pub is_new: bool,

    /// The theorem's distinct variable restrictions.
    pub dj: Vec<DjPair>,

    /// Every variable the theorem may use, including its optional ones.
    pub vars: Vec<VarId>,
}

/// A proof being worked on.
/// Steps live in an arena, and `order` lists them in proof order.
#[derive(Clone, Debug)]
pub struct Worksheet {
    pub theorem: Theorem,
    steps: Vec<Step>,
    order: Vec<StepId>,
    labels: HashMap<String, StepId>,
    generated_count: usize,
}

impl Worksheet {
    pub fn new(theorem: Theorem) -> Worksheet {
        Worksheet {
            theorem,
            steps: vec![],
            order: vec![],
            labels: HashMap::new(),
            generated_count: 0,
        }
    }

    fn push(&mut self, step: Step) -> Result<StepId, String> {
        if self.labels.contains_key(step.label()) {
            return Err(format!("duplicate step label '{}'", step.label()));
        }
        let id = StepId(self.steps.len());
        self.labels.insert(step.label().to_string(), id);
        self.steps.push(step);
        Ok(id)
    }

    pub fn add_hypothesis(
        &mut self,
        label: &str,
        hyp_label: Option<&str>,
        formula: Term,
    ) -> Result<StepId, String> {
        let id = self.push(Step::Hypothesis(HypothesisStep {
            label: label.to_string(),
            hyp_label: hyp_label.map(|s| s.to_string()),
            formula,
        }))?;
        self.order.push(id);
        Ok(id)
    }

    /// Hyps must refer to steps that come earlier in the proof.
    pub fn add_derivation(&mut self, step: DerivationStep) -> Result<StepId, String> {
        for hyp in step.hyps.iter().flatten() {
            if !self.order.contains(hyp) {
                return Err(format!(
                    "step '{}' refers to a step that is not earlier in the proof",
                    step.label
                ));
            }
        }
        let id = self.push(Step::Derivation(step))?;
        self.order.push(id);
        Ok(id)
    }

    pub fn step(&self, id: StepId) -> &Step {
        &self.steps[id.0]
    }

    /// Panics if the step is a hypothesis.
    pub fn derivation(&self, id: StepId) -> &DerivationStep {
        match &self.steps[id.0] {
            Step::Derivation(d) => d,
            Step::Hypothesis(h) => panic!("step {} is not a derivation step", h.label),
        }
    }

    pub fn derivation_mut(&mut self, id: StepId) -> &mut DerivationStep {
        match &mut self.steps[id.0] {
            Step::Derivation(d) => d,
            Step::Hypothesis(h) => panic!("step {} is not a derivation step", h.label),
        }
    }

    pub fn is_derivation(&self, id: StepId) -> bool {
        matches!(self.steps[id.0], Step::Derivation(_))
    }

    /// The steps in proof order.
    pub fn order(&self) -> &[StepId] {
        &self.order
    }

    pub fn derivation_ids(&self) -> Vec<StepId> {
        self.order
            .iter()
            .copied()
            .filter(|id| self.is_derivation(*id))
            .collect()
    }

    pub fn position(&self, id: StepId) -> Option<usize> {
        self.order.iter().position(|x| *x == id)
    }

    pub fn find_step(&self, label: &str) -> Option<StepId> {
        self.labels.get(label).copied()
    }

    pub fn label(&self, id: StepId) -> &str {
        self.steps[id.0].label()
    }

    pub fn formula(&self, id: StepId) -> Option<&Term> {
        self.steps[id.0].formula()
    }

    /// The last derivation step is the one that proves the theorem.
    pub fn qed(&self) -> Option<StepId> {
        self.order
            .iter()
            .rev()
            .copied()
            .find(|id| self.is_derivation(*id))
    }

    /// The formulas of a step's hyps, in the step's hyp order.
    /// None for a hyp that is absent or has no formula yet.
    pub fn hyp_formulas(&self, id: StepId) -> Vec<Option<Term>> {
        self.derivation(id)
            .hyps
            .iter()
            .map(|h| h.and_then(|h| self.formula(h).cloned()))
            .collect()
    }

    /// Whether the step or any of its hyps has work variables.
    pub fn has_work_vars_in_step_or_hyps(&self, id: StepId) -> bool {
        let step = self.derivation(id);
        step.has_work_vars()
            || step
                .hyps
                .iter()
                .flatten()
                .any(|h| !self.step(*h).work_vars().is_empty())
    }

    /// The first step before `end` in proof order whose formula is identical.
    pub fn find_matching_step_formula(&self, formula: &Term, end: StepId) -> Option<StepId> {
        for id in &self.order {
            if *id == end {
                break;
            }
            if self.formula(*id) == Some(formula) {
                return Some(*id);
            }
        }
        None
    }

    fn next_generated_label(&mut self) -> String {
        loop {
            self.generated_count += 1;
            let label = format!("d{}", self.generated_count);
            if !self.labels.contains_key(&label) {
                return label;
            }
        }
    }

    /// Adds a step for a derived hypothesis, just before the step that needs it.
    /// A formula with work variables can't be justified yet, so the new step gets one
    /// hyp to be derived.
    pub fn add_generated_step(&mut self, formula: Term, before: StepId) -> StepId {
        let label = self.next_generated_label();
        let incomplete = formula.has_work_vars();
        let hyps = if incomplete { vec![None] } else { vec![] };
        let mut step = DerivationStep::new(&label, Some(formula), hyps, None);
        step.derive_formula = false;
        step.formula_incomplete = incomplete;
        step.generated = true;

        let id = StepId(self.steps.len());
        self.labels.insert(label, id);
        self.steps.push(Step::Derivation(step));
        let position = self.position(before).unwrap_or(self.order.len());
        self.order.insert(position, id);
        id
    }

    pub fn set_hyp(&mut self, id: StepId, i: usize, hyp: StepId) {
        self.derivation_mut(id).hyps[i] = Some(hyp);
    }

    /// Rewires every citation of a step with a local ref to the step it refers to,
    /// then drops the replaced steps from the proof.
    pub fn apply_local_refs(&mut self) {
        let replaced: HashMap<StepId, StepId> = self
            .order
            .iter()
            .filter_map(|id| {
                let d = self.steps[id.0].as_derivation()?;
                d.local_ref.map(|target| (*id, target))
            })
            .collect();
        if replaced.is_empty() {
            return;
        }
        for step in self.steps.iter_mut() {
            if let Step::Derivation(d) = step {
                if d.local_ref.is_some() {
                    continue;
                }
                for hyp in d.hyps.iter_mut().flatten() {
                    if let Some(target) = replaced.get(hyp) {
                        *hyp = *target;
                    }
                }
            }
        }
        self.order.retain(|id| !replaced.contains_key(id));
    }

    /// Checks that every step with a Ref cites as many hyps as the Ref has.
    /// The engine relies on this.
    pub fn validate(&self, catalog: &Catalog) -> Result<(), String> {
        for id in &self.order {
            let Some(d) = self.steps[id.0].as_derivation() else {
                continue;
            };
            if let Some(a) = d.reference {
                let assertion = catalog.get(a);
                if d.hyps.len() != assertion.num_log_hyps() {
                    return Err(format!(
                        "step {} has {} hyps but {} has {}",
                        d.label,
                        d.hyps.len(),
                        assertion.label,
                        assertion.num_log_hyps()
                    ));
                }
                if assertion.seq >= self.theorem.seq {
                    return Err(format!(
                        "step {} cites {}, which comes after {}",
                        d.label, assertion.label, self.theorem.label
                    ));
                }
            }
            if d.auto_step && d.formula.is_none() {
                return Err(format!("auto step {} needs a formula", d.label));
            }
        }
        if self.qed().is_none() {
            return Err("the proof has no derivation steps".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::symbol_table::SymbolTable;

    fn setup() -> (SymbolTable, Worksheet) {
        let mut table = SymbolTable::new();
        let wff = table.add_type("wff", "&W").unwrap();
        table.add_syntax("wi", wff, vec![wff, wff]).unwrap();
        table.add_var("ph", wff).unwrap();
        table.add_var("ps", wff).unwrap();
        let worksheet = Worksheet::new(Theorem {
            label: "t".to_string(),
            seq: 100,
            is_new: false,
            dj: vec![],
            vars: vec![0, 1],
        });
        (table, worksheet)
    }

    #[test]
    fn test_generated_steps_go_before() {
        let (table, mut ws) = setup();
        let parse = |s: &str| Term::parse(s, &table).unwrap();
        let h1 = ws.add_hypothesis("h1", Some("t.1"), parse("ph")).unwrap();
        let s2 = ws
            .add_derivation(DerivationStep::new("2", Some(parse("ps")), vec![Some(h1), None], None))
            .unwrap();
        let d1 = ws.add_generated_step(parse("wi(ph, &W1)"), s2);
        assert_eq!(ws.order(), &[h1, d1, s2]);
        assert_eq!(ws.label(d1), "d1");
        assert!(ws.derivation(d1).hyps_incomplete());
        assert!(ws.derivation(d1).formula_incomplete);
        assert_eq!(ws.find_matching_step_formula(&parse("ph"), s2), Some(h1));
        assert_eq!(ws.find_matching_step_formula(&parse("ph"), h1), None);
        assert_eq!(ws.qed(), Some(s2));
    }

    #[test]
    fn test_local_refs_rewire_citations() {
        let (table, mut ws) = setup();
        let parse = |s: &str| Term::parse(s, &table).unwrap();
        let h1 = ws.add_hypothesis("h1", None, parse("ph")).unwrap();
        let s2 = ws
            .add_derivation(DerivationStep::new("2", Some(parse("ph")), vec![], None))
            .unwrap();
        let s3 = ws
            .add_derivation(DerivationStep::new("3", Some(parse("ps")), vec![Some(s2)], None))
            .unwrap();
        ws.derivation_mut(s2).local_ref = Some(h1);
        ws.apply_local_refs();
        assert_eq!(ws.order(), &[h1, s3]);
        assert_eq!(ws.derivation(s3).hyps, vec![Some(h1)]);
    }

    #[test]
    fn test_hyps_must_come_earlier() {
        let (table, mut ws) = setup();
        let step = DerivationStep::new(
            "2",
            Some(Term::parse("ph", &table).unwrap()),
            vec![Some(StepId(5))],
            None,
        );
        assert!(ws.add_derivation(step).is_err());
    }
}
