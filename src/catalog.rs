use std::collections::HashSet;

use qp_trie::Trie;
use tracing::debug;

use crate::kernel::atom::{AssertionId, Atom, DjPair, TypeId, VarId};
use crate::kernel::fingerprint::AssertionFingerprint;
use crate::kernel::term::Term;

/// An axiom or theorem that can justify a proof step.
#[derive(Clone, Debug)]
pub struct Assertion {
    pub label: String,

    /// Only assertions with a smaller sequence number than the theorem being proved may be used.
    pub seq: u32,

    /// The variables occurring in the hypotheses or conclusion, sorted.
    /// These are the only variables that unification may substitute.
    pub mand_vars: Vec<VarId>,

    /// The type of each mandatory variable, parallel to mand_vars.
    pub var_types: Vec<TypeId>,

    pub log_hyps: Vec<Term>,
    pub formula: Term,

    /// Distinct variable restrictions between mandatory variables.
    pub dj: Vec<DjPair>,

    pub fingerprint: AssertionFingerprint,
}

impl Assertion {
    pub fn new(
        label: &str,
        seq: u32,
        log_hyps: Vec<Term>,
        formula: Term,
        dj: Vec<DjPair>,
    ) -> Assertion {
        let mut typed = vec![];
        for hyp in &log_hyps {
            hyp.collect_typed_vars(&mut typed);
        }
        formula.collect_typed_vars(&mut typed);
        typed.sort_unstable();
        let (mand_vars, var_types): (Vec<VarId>, Vec<TypeId>) = typed.into_iter().unzip();

        let mut dj: Vec<DjPair> = dj
            .into_iter()
            .filter(|p| {
                p.0 != p.1
                    && mand_vars.binary_search(&p.0).is_ok()
                    && mand_vars.binary_search(&p.1).is_ok()
            })
            .collect();
        dj.sort_unstable();
        dj.dedup();

        let fingerprint = AssertionFingerprint::new(&formula, &log_hyps);
        Assertion {
            label: label.to_string(),
            seq,
            mand_vars,
            var_types,
            log_hyps,
            formula,
            dj,
            fingerprint,
        }
    }

    /// The hypothesis array holds the variable slots first, then the logical hypotheses.
    pub fn num_slots(&self) -> usize {
        self.mand_vars.len() + self.log_hyps.len()
    }

    pub fn num_log_hyps(&self) -> usize {
        self.log_hyps.len()
    }

    pub fn log_hyp_slot(&self, i: usize) -> usize {
        self.mand_vars.len() + i
    }

    pub fn slot_of_var(&self, v: VarId) -> Option<usize> {
        self.mand_vars.binary_search(&v).ok()
    }

    /// Applies a substitution, indexed by hypothesis slot, to one of this assertion's formulas.
    /// Unbound variables stay as they are.
    pub fn instantiate(&self, term: &Term, subst: &[Option<Term>]) -> Term {
        term.replace_leaves(&|atom| match atom {
            Atom::Var(v) => {
                let slot = self.slot_of_var(*v)?;
                subst.get(slot)?.clone()
            }
            _ => None,
        })
    }
}

/// The assertions available to a unification pass, sorted by sequence number.
/// It is read-only during a pass, so several passes may share it.
pub struct Catalog {
    assertions: Vec<Assertion>,

    /// Maps labels to assertion ids.
    labels: Trie<Vec<u8>, AssertionId>,
}

impl Catalog {
    pub fn new(mut assertions: Vec<Assertion>) -> Result<Catalog, String> {
        assertions.sort_by_key(|a| a.seq);
        let mut labels = Trie::new();
        for (id, assertion) in assertions.iter().enumerate() {
            if labels
                .insert(assertion.label.as_bytes().to_vec(), id)
                .is_some()
            {
                return Err(format!("duplicate assertion label '{}'", assertion.label));
            }
        }
        debug!(assertions = assertions.len(), "built catalog");
        Ok(Catalog { assertions, labels })
    }

    pub fn len(&self) -> usize {
        self.assertions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assertions.is_empty()
    }

    pub fn get(&self, id: AssertionId) -> &Assertion {
        &self.assertions[id]
    }

    pub fn lookup(&self, label: &str) -> Option<AssertionId> {
        self.labels.get(label.as_bytes()).copied()
    }

    /// Resolves exclusion patterns. A trailing '*' matches every label with that prefix.
    pub fn excluded(&self, patterns: &[String]) -> HashSet<AssertionId> {
        let mut answer = HashSet::new();
        for pattern in patterns {
            match pattern.strip_suffix('*') {
                Some(prefix) => {
                    for (_, id) in self.labels.iter_prefix(prefix.as_bytes()) {
                        answer.insert(*id);
                    }
                }
                None => {
                    if let Some(id) = self.lookup(pattern) {
                        answer.insert(id);
                    }
                }
            }
        }
        answer
    }

    /// The candidates for a theorem with the given sequence number, in sequence order.
    pub fn search_list(&self, max_seq: u32, exclude: &[String]) -> Vec<AssertionId> {
        let excluded = self.excluded(exclude);
        self.assertions
            .iter()
            .enumerate()
            .take_while(|(_, a)| a.seq < max_seq)
            .filter(|(id, _)| !excluded.contains(id))
            .map(|(id, _)| id)
            .collect()
    }
}
