use tracing::trace;

use crate::catalog::Assertion;
use crate::kernel::atom::AssertionId;
use crate::kernel::fingerprint::sort_by_complexity;
use crate::kernel::variable_map::{Fragment, SubstTable};
use crate::unify::context::{StepTarget, UnifyStats};
use crate::unify::pairwise::{match_formula, unify_hyp, Memo, MemoTable};
use crate::unify::result::Unification;

/// Unifies a step that has no work variables with one assertion.
///
/// Hyps are tried in the step's order first, since that is usually right. Two hyps get
/// one swap. Beyond that we backtrack over assignments of step hyps to assertion
/// hypotheses, memoizing every pairwise match.
pub fn unify_step_without_work_vars(
    stats: &mut UnifyStats,
    target: &StepTarget,
    id: AssertionId,
    assertion: &Assertion,
) -> Option<Unification> {
    let fragment = match_formula(stats, target, assertion)?;
    let n = assertion.num_log_hyps();
    if target.hyps.len() != n {
        return None;
    }
    let matched = |subst: SubstTable, order: Option<Vec<usize>>| {
        Some(Unification {
            assertion: id,
            subst: subst.into_slots(),
            order,
        })
    };

    let mut subst = SubstTable::with_fragment(assertion.num_slots(), &fragment);
    if n == 0 {
        return matched(subst, None);
    }

    let mut direct: Vec<Fragment> = vec![];
    let mut level = 0;
    while level < n {
        let Some(f) = unify_hyp(
            stats,
            assertion,
            &assertion.log_hyps[level],
            target.hyps[level].as_ref(),
        ) else {
            break;
        };
        let merged = subst.merge(level, &f);
        direct.push(f);
        if !merged {
            break;
        }
        level += 1;
    }
    if level == n {
        return matched(subst, None);
    }
    if n == 1 {
        return None;
    }

    if n == 2 {
        if level > 0 {
            subst = SubstTable::with_fragment(assertion.num_slots(), &fragment);
        }
        for (level, (a, s)) in [(0, 1), (1, 0)].into_iter().enumerate() {
            let f = unify_hyp(
                stats,
                assertion,
                &assertion.log_hyps[a],
                target.hyps[s].as_ref(),
            )?;
            if !subst.merge(level, &f) {
                return None;
            }
        }
        return matched(subst, Some(vec![1, 0]));
    }

    let mut search = Backtrack::new(stats, target, assertion, &fragment, &direct);
    let order = search.run()?;
    matched(search.subst, Some(order))
}

// The general case: level i assigns the i-th easiest step hyp to some assertion hypothesis.
struct Backtrack<'a> {
    stats: &'a mut UnifyStats,
    target: &'a StepTarget,
    assertion: &'a Assertion,
    n: usize,

    // Step hyp indices, easiest first.
    step_sorted: Vec<usize>,

    memo: MemoTable<Fragment>,
    subst: SubstTable,

    // used[c] when sorted assertion hypothesis c is assigned at some level.
    used: Vec<bool>,

    // The sorted assertion hypothesis assigned at each level.
    xref: Vec<Option<usize>>,

    // How many assertion hypotheses are known not to match each level.
    impossible: Vec<usize>,
}

impl<'a> Backtrack<'a> {
    fn new(
        stats: &'a mut UnifyStats,
        target: &'a StepTarget,
        assertion: &'a Assertion,
        fragment: &Fragment,
        direct: &[Fragment],
    ) -> Backtrack<'a> {
        let n = assertion.num_log_hyps();
        let step_sorted = sort_by_complexity(
            target.hyps.iter().map(|h| h.as_ref()),
            target.formula.as_ref(),
        );
        let mut memo = MemoTable::new(n);

        // The in-order attempt already matched some pairs.
        for (i, f) in direct.iter().enumerate() {
            if let Some(row) = step_sorted.iter().position(|s| *s == i) {
                let col = assertion.fingerprint.sorted_reverse[i];
                memo.set(row, col, Memo::Answer(f.clone()));
            }
        }

        Backtrack {
            stats,
            target,
            assertion,
            n,
            step_sorted,
            memo,
            subst: SubstTable::with_fragment(assertion.num_slots(), fragment),
            used: vec![false; n],
            xref: vec![None; n],
            impossible: vec![0; n],
        }
    }

    // Returns order[i] = the step hyp that matched assertion hypothesis i.
    fn run(&mut self) -> Option<Vec<usize>> {
        let mut level = 0;
        while level < self.n {
            if self.find_next(level) {
                level += 1;
                continue;
            }
            if self.impossible[level] >= self.n || level == 0 {
                trace!(label = self.assertion.label.as_str(), "backtracking failed");
                return None;
            }
            level -= 1;
            self.subst.undo_level(level);
        }

        let mut order = vec![0; self.n];
        for level in 0..self.n {
            let col = self.xref[level]?;
            order[self.assertion.fingerprint.sorted_log_hyps[col]] = self.step_sorted[level];
        }
        Some(order)
    }

    // Assigns the next assertion hypothesis that fits at this level, after the current one.
    fn find_next(&mut self, level: usize) -> bool {
        let mut col = match self.xref[level].take() {
            Some(previous) => {
                self.used[previous] = false;
                previous + 1
            }
            None => 0,
        };
        let step_hyp = self.target.hyps[self.step_sorted[level]].as_ref();

        while col < self.n {
            let c = col;
            col += 1;
            if self.used[c] {
                continue;
            }
            if let Memo::Impossible = self.memo.get(level, c) {
                continue;
            }
            let hyp = &self.assertion.log_hyps[self.assertion.fingerprint.sorted_log_hyps[c]];

            if let Some(step_hyp) = step_hyp {
                let depth = step_hyp.max_depth();
                if depth > 0 && hyp.max_depth() > depth {
                    self.memo.set(level, c, Memo::Impossible);
                    self.impossible[level] += 1;
                    continue;
                }
            }

            let merged = match self.memo.get(level, c) {
                Memo::Answer(f) => self.subst.merge(level, f),
                _ => match unify_hyp(self.stats, self.assertion, hyp, step_hyp) {
                    None => {
                        self.memo.set(level, c, Memo::Impossible);
                        self.impossible[level] += 1;
                        continue;
                    }
                    Some(f) => {
                        let merged = self.subst.merge(level, &f);
                        self.memo.set(level, c, Memo::Answer(f));
                        merged
                    }
                },
            };
            if merged {
                self.xref[level] = Some(c);
                self.used[c] = true;
                return true;
            }
        }
        false
    }
}
