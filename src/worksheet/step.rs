use std::fmt;

use serde::Serialize;

use crate::kernel::atom::{AssertionId, DjPair, WorkVarId};
use crate::kernel::proof_tree::ProofNode;
use crate::kernel::term::Term;

/// A handle for a step in the worksheet's arena.
/// Handles stay valid when steps are inserted or removed from the proof order.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct StepId(pub usize);

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How far unification got for a derivation step.
/// The last three variants are proper, from strongest to weakest.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum UnificationStatus {
    NotUnified,

    // A hypothesis has no formula, so there was nothing to unify against.
    AttemptCancelled,

    UnificationError,

    Unified,
    UnifiedWithWorkVars,
    UnifiedWithIncompleteHyps,
}

impl UnificationStatus {
    pub fn is_proper(&self) -> bool {
        matches!(
            self,
            UnificationStatus::Unified
                | UnificationStatus::UnifiedWithWorkVars
                | UnificationStatus::UnifiedWithIncompleteHyps
        )
    }

    /// Whether a proof can be attempted for a step with this status.
    pub fn is_provable(&self) -> bool {
        matches!(
            self,
            UnificationStatus::Unified | UnificationStatus::UnifiedWithWorkVars
        )
    }

    fn weakness(&self) -> u8 {
        match self {
            UnificationStatus::Unified => 0,
            UnificationStatus::UnifiedWithWorkVars => 1,
            UnificationStatus::UnifiedWithIncompleteHyps => 2,
            _ => 3,
        }
    }

    /// The weaker of two statuses. Improper statuses are weaker than any proper one.
    pub fn combine(self, other: UnificationStatus) -> UnificationStatus {
        if other.weakness() > self.weakness() {
            other
        } else {
            self
        }
    }
}

/// The outcome of checking distinct variable restrictions for a unification.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub enum DjVarsStatus {
    #[default]
    None,

    // Adding restrictions to the theorem would fix it.
    Soft,

    // Nothing can fix it.
    Hard,
}

/// A hypothesis of the theorem being proved.
#[derive(Clone, Debug)]
pub struct HypothesisStep {
    pub label: String,

    /// The label of the theorem's hypothesis, like "t.1".
    /// A new theorem has no hypothesis labels yet.
    pub hyp_label: Option<String>,

    pub formula: Term,
}

/// One line of a proof, justified by an assertion applied to earlier steps.
#[derive(Clone, Debug)]
pub struct DerivationStep {
    pub label: String,

    /// None until derived, when the formula is requested from the Ref.
    pub formula: Option<Term>,

    /// The formula was requested from the Ref rather than given.
    pub derive_formula: bool,

    /// The derived formula still contains work variables.
    pub formula_incomplete: bool,

    /// References to earlier steps. None is a hypothesis to be derived.
    pub hyps: Vec<Option<StepId>>,

    /// The justifying assertion, either given or found by unification.
    pub reference: Option<AssertionId>,

    /// Hyps are to be found among earlier steps.
    pub auto_step: bool,

    /// Created while deriving another step's hypotheses.
    pub generated: bool,

    pub status: UnificationStatus,
    pub dj_status: DjVarsStatus,

    /// The distinct variable message to report if this step's Ref is kept.
    pub held_dj_message: Option<String>,

    /// Restrictions the theorem would need for the current Ref.
    pub soft_dj_errors: Vec<DjPair>,

    /// Parallel to the Ref's hypothesis array.
    /// Variable slots hold their substitutions, hypothesis slots stay empty.
    pub subst: Vec<Option<Term>>,

    /// Work variables in the formula, in order of appearance.
    pub work_vars: Vec<WorkVarId>,

    /// Other assertions that unify with this step.
    pub alternates: Vec<AssertionId>,

    pub proof: Option<ProofNode>,
    pub verify_error: bool,

    /// An earlier step with the identical formula, which replaces this one.
    pub local_ref: Option<StepId>,
}

impl DerivationStep {
    pub fn new(
        label: &str,
        formula: Option<Term>,
        hyps: Vec<Option<StepId>>,
        reference: Option<AssertionId>,
    ) -> DerivationStep {
        let work_vars = formula.as_ref().map(|f| f.work_vars()).unwrap_or_default();
        DerivationStep {
            label: label.to_string(),
            derive_formula: formula.is_none(),
            formula,
            formula_incomplete: false,
            hyps,
            reference,
            auto_step: false,
            generated: false,
            status: UnificationStatus::NotUnified,
            dj_status: DjVarsStatus::None,
            held_dj_message: None,
            soft_dj_errors: vec![],
            subst: vec![],
            work_vars,
            alternates: vec![],
            proof: None,
            verify_error: false,
            local_ref: None,
        }
    }

    /// Some hypotheses are still to be derived.
    pub fn hyps_incomplete(&self) -> bool {
        self.hyps.iter().any(|h| h.is_none())
    }

    pub fn has_work_vars(&self) -> bool {
        !self.work_vars.is_empty()
    }

    /// Replaces the formula and recomputes its work variables.
    pub fn set_formula(&mut self, formula: Term) {
        self.work_vars = formula.work_vars();
        self.formula = Some(formula);
    }

    pub fn add_alternate(&mut self, assertion: AssertionId) {
        if !self.alternates.contains(&assertion) {
            self.alternates.push(assertion);
        }
    }
}

#[derive(Clone, Debug)]
pub enum Step {
    Hypothesis(HypothesisStep),
    Derivation(DerivationStep),
}

impl Step {
    pub fn label(&self) -> &str {
        match self {
            Step::Hypothesis(h) => &h.label,
            Step::Derivation(d) => &d.label,
        }
    }

    pub fn formula(&self) -> Option<&Term> {
        match self {
            Step::Hypothesis(h) => Some(&h.formula),
            Step::Derivation(d) => d.formula.as_ref(),
        }
    }

    pub fn as_derivation(&self) -> Option<&DerivationStep> {
        match self {
            Step::Derivation(d) => Some(d),
            Step::Hypothesis(_) => None,
        }
    }

    pub fn as_derivation_mut(&mut self) -> Option<&mut DerivationStep> {
        match self {
            Step::Derivation(d) => Some(d),
            Step::Hypothesis(_) => None,
        }
    }

    /// Work variables in this step's formula. Hypothesis steps never have any.
    pub fn work_vars(&self) -> &[WorkVarId] {
        match self {
            Step::Derivation(d) => &d.work_vars,
            Step::Hypothesis(_) => &[],
        }
    }

    pub fn status(&self) -> Option<UnificationStatus> {
        self.as_derivation().map(|d| d.status)
    }
}
