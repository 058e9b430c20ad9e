use crate::catalog::Assertion;
use crate::config::DjVarsSoftErrors;
use crate::kernel::atom::DjPair;
use crate::kernel::symbol_table::SymbolTable;
use crate::kernel::term::Term;
use crate::unify::result::DjCheck;

/// Checks an assertion's distinct variable restrictions under a substitution.
///
/// Two substitutions that share a variable or work variable can never be distinct.
/// Two distinct variables are fine if the frame says so. Otherwise the theorem would
/// need a new restriction, which is a soft error.
pub fn check_dj_vars(
    symbols: &SymbolTable,
    mode: DjVarsSoftErrors,
    frame: &[DjPair],
    assertion: &Assertion,
    subst: &[Option<Term>],
) -> DjCheck {
    let mut answer = DjCheck::default();
    for pair in &assertion.dj {
        let (Some(x), Some(y)) = (assertion.slot_of_var(pair.0), assertion.slot_of_var(pair.1))
        else {
            continue;
        };
        let (Some(sx), Some(sy)) = (&subst[x], &subst[y]) else {
            continue;
        };

        let x_vars = sx.vars();
        let y_vars = sy.vars();
        let shared = match x_vars.iter().find(|u| y_vars.contains(u)) {
            Some(u) => Some(symbols.var(*u).name.clone()),
            None => sx
                .work_vars()
                .into_iter()
                .find(|w| sy.contains_work_var(*w))
                .map(|w| symbols.work_var_name(w)),
        };
        if let Some(name) = shared {
            answer.hard = Some(format!(
                "{} requires {} and {} to be distinct, but {} occurs in both {} and {}",
                assertion.label,
                symbols.var(pair.0).name,
                symbols.var(pair.1).name,
                name,
                sx.display(symbols),
                sy.display(symbols)
            ));
            return answer;
        }

        if mode == DjVarsSoftErrors::Ignore {
            continue;
        }
        for u in &x_vars {
            for v in &y_vars {
                let needed = DjPair::new(*u, *v);
                if frame.binary_search(&needed).is_err() && !answer.soft.contains(&needed) {
                    answer.soft.push(needed);
                }
            }
        }
    }
    answer
}

/// Describes missing restrictions, like "$d x y $. $d x z $."
pub fn describe_soft(symbols: &SymbolTable, soft: &[DjPair]) -> String {
    soft.iter()
        .map(|p| format!("$d {} {} $.", symbols.var(p.0).name, symbols.var(p.1).name))
        .collect::<Vec<_>>()
        .join(" ")
}

/// The restrictions to declare for a theorem, given its own and the soft errors found.
/// The result is sorted and has no duplicates.
pub fn dj_vars_to_declare(
    mode: DjVarsSoftErrors,
    theorem_dj: &[DjPair],
    soft_lists: &[Vec<DjPair>],
) -> Vec<DjPair> {
    let mut soft: Vec<DjPair> = soft_lists.iter().flatten().copied().collect();
    soft.sort_unstable();
    soft.dedup();
    let mut answer = match mode {
        DjVarsSoftErrors::Ignore | DjVarsSoftErrors::Report => vec![],
        DjVarsSoftErrors::GenerateReplacements => {
            let mut all = theorem_dj.to_vec();
            all.extend(soft);
            all
        }
        DjVarsSoftErrors::GenerateDifferences => soft
            .into_iter()
            .filter(|p| !theorem_dj.contains(p))
            .collect(),
        DjVarsSoftErrors::GenerateNew => soft,
    };
    answer.sort_unstable();
    answer.dedup();
    answer
}
