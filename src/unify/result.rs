use crate::kernel::atom::{AssertionId, DjPair};
use crate::kernel::term::Term;
use crate::worksheet::step::StepId;

/// A successful match of a step against an assertion.
#[derive(Clone, Debug)]
pub struct Unification {
    pub assertion: AssertionId,

    /// Parallel to the assertion's hypothesis array. Variable slots are bound.
    pub subst: Vec<Option<Term>>,

    /// When the step's hyps matched in a different order, order[i] is the index of the
    /// step hyp that matched assertion hypothesis i.
    pub order: Option<Vec<usize>>,
}

impl Unification {
    /// Puts a step's hyps in the order of the assertion's hypotheses.
    pub fn rearrange<T: Clone>(&self, hyps: &[T]) -> Vec<T> {
        match &self.order {
            Some(order) => order.iter().map(|i| hyps[*i].clone()).collect(),
            None => hyps.to_vec(),
        }
    }
}

/// A complete way to justify an auto step from earlier steps.
#[derive(Clone, Debug)]
pub struct AutoMatch {
    pub assertion: AssertionId,
    pub subst: Vec<Option<Term>>,

    /// The chosen earlier steps, in the assertion's hypothesis order.
    pub hyps: Vec<StepId>,

    /// Restrictions the theorem would need.
    pub soft: Vec<DjPair>,
}

/// The outcome of trying to complete an auto step with one assertion.
#[derive(Clone, Debug)]
pub enum UnifyResult {
    Impossible,

    /// It works if the theorem gets more distinct variable restrictions.
    Possible(AutoMatch),

    Proper(AutoMatch),
}

impl UnifyResult {
    /// Between two possible results, the one needing fewer new restrictions wins.
    /// Ties keep the earlier one.
    pub fn better(self, other: UnifyResult) -> UnifyResult {
        match (&self, &other) {
            (UnifyResult::Proper(_), _) => self,
            (_, UnifyResult::Proper(_)) => other,
            (UnifyResult::Impossible, _) => other,
            (_, UnifyResult::Impossible) => self,
            (UnifyResult::Possible(a), UnifyResult::Possible(b)) => {
                if b.soft.len() < a.soft.len() {
                    other
                } else {
                    self
                }
            }
        }
    }
}

/// The distinct variable check of one unification.
#[derive(Clone, Debug, Default)]
pub struct DjCheck {
    /// Why the unification can never satisfy the restrictions.
    pub hard: Option<String>,

    /// Restrictions the theorem lacks, in the order found.
    pub soft: Vec<DjPair>,
}

impl DjCheck {
    pub fn is_clean(&self) -> bool {
        self.hard.is_none() && self.soft.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn possible(assertion: AssertionId, soft: usize) -> UnifyResult {
        UnifyResult::Possible(AutoMatch {
            assertion,
            subst: vec![],
            hyps: vec![],
            soft: (0..soft as u16).map(|i| DjPair::new(i, i + 10)).collect(),
        })
    }

    fn assertion_of(result: &UnifyResult) -> Option<AssertionId> {
        match result {
            UnifyResult::Possible(m) | UnifyResult::Proper(m) => Some(m.assertion),
            UnifyResult::Impossible => None,
        }
    }

    #[test]
    fn test_better_prefers_fewer_soft_errors() {
        let best = possible(1, 3).better(possible(2, 1));
        assert_eq!(assertion_of(&best), Some(2));
        let best = possible(1, 1).better(possible(2, 1));
        assert_eq!(assertion_of(&best), Some(1));
        let best = UnifyResult::Impossible.better(possible(4, 2));
        assert_eq!(assertion_of(&best), Some(4));
    }

    #[test]
    fn test_rearrange() {
        let u = Unification {
            assertion: 0,
            subst: vec![],
            order: Some(vec![2, 0, 1]),
        };
        assert_eq!(u.rearrange(&["a", "b", "c"]), vec!["c", "a", "b"]);
    }
}
