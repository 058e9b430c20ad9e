use crate::catalog::Assertion;
use crate::kernel::term::Term;
use crate::kernel::variable_map::{unify_subtree, Fragment};
use crate::unify::context::{StepTarget, UnifyStats};
use crate::unify::filter::{is_candidate, syntax_contained};

/// What we know about matching one assertion hypothesis against one step hyp.
#[derive(Clone, Debug)]
pub enum Memo<T> {
    Untried,
    Impossible,

    /// The pair matches on its own. Whether it fits with the other levels is a separate question.
    Answer(T),
}

/// Pairwise match results for one backtracking search.
/// Rows are backtracking levels, columns are sorted assertion hypothesis positions.
/// A pair is matched at most once per search, however often the search revisits it.
pub struct MemoTable<T> {
    n: usize,
    cells: Vec<Memo<T>>,
}

impl<T: Clone> MemoTable<T> {
    pub fn new(n: usize) -> MemoTable<T> {
        MemoTable {
            n,
            cells: vec![Memo::Untried; n * n],
        }
    }

    pub fn get(&self, row: usize, col: usize) -> &Memo<T> {
        &self.cells[row * self.n + col]
    }

    pub fn set(&mut self, row: usize, col: usize, memo: Memo<T>) {
        self.cells[row * self.n + col] = memo;
    }
}

/// Matches one assertion hypothesis against one step hyp.
/// A hyp to be derived matches anything and binds nothing.
pub fn unify_hyp(
    stats: &mut UnifyStats,
    assertion: &Assertion,
    hyp: &Term,
    step_hyp: Option<&Term>,
) -> Option<Fragment> {
    let Some(step_hyp) = step_hyp else {
        return Some(vec![]);
    };
    stats.pairwise_attempts += 1;
    if !syntax_contained(&hyp.syntax_multiset(), &step_hyp.syntax_multiset()) {
        return None;
    }
    unify_subtree(hyp, step_hyp, &assertion.mand_vars)
}

/// Matches the assertion's conclusion against the step's formula, after the cheap filters.
pub fn match_formula(
    stats: &mut UnifyStats,
    target: &StepTarget,
    assertion: &Assertion,
) -> Option<Fragment> {
    let formula = target.formula.as_ref()?;
    stats.candidates += 1;
    if !is_candidate(target, assertion) {
        return None;
    }
    if !syntax_contained(
        &assertion.formula.syntax_multiset(),
        &formula.syntax_multiset(),
    ) {
        return None;
    }
    unify_subtree(&assertion.formula, formula, &assertion.mand_vars)
}
