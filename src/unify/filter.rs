use crate::catalog::Assertion;
use crate::kernel::atom::SyntaxId;
use crate::unify::context::StepTarget;

/// Rejects assertions that cannot possibly match the step, using only precomputed keys.
/// Returning true does not mean the assertion matches.
pub fn is_candidate(target: &StepTarget, assertion: &Assertion) -> bool {
    // Work variables can stand for any subtree, so none of the keys are reliable.
    if target.has_work_vars {
        return true;
    }
    let fingerprint = &assertion.fingerprint;

    if !target.derive_formula {
        match &fingerprint.shape {
            Some(shape) => {
                if target.shape.as_ref() != Some(shape) {
                    return false;
                }
            }
            None => {
                // Only the root can be compared, and only if it isn't a variable.
                if let Some(root) = assertion.formula.head_syntax() {
                    if target.root != Some(root) {
                        return false;
                    }
                }
            }
        }
    }

    if !target.derive_hyps {
        if let (Some(a), Some(s)) = (&fingerprint.hyps_hi_lo, &target.hyps_hi_lo) {
            if a != s {
                return false;
            }
        }
    }

    // Substitution never makes a formula shallower.
    if !target.derive_formula
        && target.formula_depth > 0
        && fingerprint.formula_depth > target.formula_depth
    {
        return false;
    }
    if !target.derive_hyps
        && target.hyps_max_depth > 0
        && fingerprint.log_hyps_max_depth > target.hyps_max_depth
    {
        return false;
    }

    true
}

/// Every syntax axiom in the general term must occur at least as often in the special term.
pub fn syntax_contained(general: &[SyntaxId], special: &[SyntaxId]) -> bool {
    let mut j = 0;
    for s in general {
        while j < special.len() && special[j] < *s {
            j += 1;
        }
        if j == special.len() || special[j] != *s {
            return false;
        }
        j += 1;
    }
    true
}
