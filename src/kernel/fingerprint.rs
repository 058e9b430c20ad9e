use crate::kernel::atom::SyntaxId;
use crate::kernel::term::Term;

/// The syntax axiom at the root of a formula, plus the syntax axioms of its children.
pub type ShapeKey = (SyntaxId, Vec<SyntaxId>);

/// The highest and lowest root syntax axiom across a set of hypotheses.
/// It is independent of hypothesis order, so it can reject a candidate
/// before any hypothesis matching is attempted.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct HiLoKey {
    pub hi: SyntaxId,
    pub lo: SyntaxId,
}

impl HiLoKey {
    /// None if there are no hypotheses, any hypothesis is missing,
    /// or any hypothesis root is a variable.
    pub fn from_formulas<'a, I>(formulas: I) -> Option<HiLoKey>
    where
        I: IntoIterator<Item = Option<&'a Term>>,
    {
        let mut key: Option<HiLoKey> = None;
        for formula in formulas {
            let root = formula?.head_syntax()?;
            key = Some(match key {
                None => HiLoKey { hi: root, lo: root },
                Some(k) => HiLoKey {
                    hi: k.hi.max(root),
                    lo: k.lo.min(root),
                },
            });
        }
        key
    }
}

/// The cheap structural facts about an assertion used to reject candidates quickly.
#[derive(Clone, Debug)]
pub struct AssertionFingerprint {
    pub shape: Option<ShapeKey>,
    pub hyps_hi_lo: Option<HiLoKey>,
    pub formula_depth: usize,
    pub log_hyps_max_depth: usize,

    /// Logical hypothesis indices, easiest to match first.
    pub sorted_log_hyps: Vec<usize>,

    /// The inverse of sorted_log_hyps: reverse[i] is the sorted position of hypothesis i.
    pub sorted_reverse: Vec<usize>,
}

impl AssertionFingerprint {
    pub fn new(formula: &Term, log_hyps: &[Term]) -> AssertionFingerprint {
        let sorted_log_hyps = sort_by_complexity(log_hyps.iter().map(Some), Some(formula));
        let mut sorted_reverse = vec![0; sorted_log_hyps.len()];
        for (position, i) in sorted_log_hyps.iter().enumerate() {
            sorted_reverse[*i] = position;
        }
        AssertionFingerprint {
            shape: formula.level_one_two(),
            hyps_hi_lo: HiLoKey::from_formulas(log_hyps.iter().map(Some)),
            formula_depth: formula.max_depth(),
            log_hyps_max_depth: max_depth_of(log_hyps.iter().map(Some)),
            sorted_log_hyps,
            sorted_reverse,
        }
    }
}

pub fn max_depth_of<'a, I>(formulas: I) -> usize
where
    I: IntoIterator<Item = Option<&'a Term>>,
{
    formulas
        .into_iter()
        .flatten()
        .map(|f| f.max_depth())
        .max()
        .unwrap_or(0)
}

/// Orders hypotheses so the smallest formulas come first.
/// Among equal sizes, hypotheses sharing a variable with the conclusion come first,
/// because they expose inconsistent substitutions sooner.
/// Missing hypotheses go last.
pub fn sort_by_complexity<'a, I>(hyps: I, conclusion: Option<&Term>) -> Vec<usize>
where
    I: IntoIterator<Item = Option<&'a Term>>,
{
    let conclusion_vars = conclusion.map(|c| c.vars()).unwrap_or_default();
    let mut keyed: Vec<(usize, bool, usize)> = hyps
        .into_iter()
        .enumerate()
        .map(|(i, hyp)| match hyp {
            Some(term) => {
                let shares = term.vars().iter().any(|v| conclusion_vars.contains(v));
                (term.node_count(), !shares, i)
            }
            None => (usize::MAX, true, i),
        })
        .collect();
    keyed.sort();
    keyed.into_iter().map(|(_, _, i)| i).collect()
}
