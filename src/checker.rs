use crate::catalog::Catalog;
use crate::kernel::proof_tree::ProofNode;
use crate::kernel::symbol_table::SymbolTable;
use crate::kernel::term::Term;

/// The checker verifies a step's proof tree without trusting anything the unifier computed.
/// It recomputes every conclusion from the assertions and substitutions in the tree.
pub struct Checker<'a> {
    catalog: &'a Catalog,
    symbols: &'a SymbolTable,
}

impl<'a> Checker<'a> {
    pub fn new(catalog: &'a Catalog, symbols: &'a SymbolTable) -> Self {
        Checker { catalog, symbols }
    }

    /// Checks that the proof is well formed and proves the expected formula.
    pub fn check(&self, proof: &ProofNode, expected: &Term) -> Result<(), String> {
        let conclusion = self.conclusion(proof)?;
        if &conclusion != expected {
            return Err(format!(
                "the proof concludes {} instead of {}",
                conclusion.display(self.symbols),
                expected.display(self.symbols)
            ));
        }
        Ok(())
    }

    fn conclusion(&self, node: &ProofNode) -> Result<Term, String> {
        let (assertion_id, children) = match node {
            ProofNode::Hyp { formula, .. } => return Ok(formula.clone()),
            ProofNode::Syntax(term) => {
                return Err(format!(
                    "{} stands where a proof is expected",
                    term.display(self.symbols)
                ))
            }
            ProofNode::Apply {
                assertion,
                children,
            } => (*assertion, children),
        };
        let assertion = self.catalog.get(assertion_id);
        if children.len() != assertion.num_slots() {
            return Err(format!(
                "{} takes {} hypotheses but was given {}",
                assertion.label,
                assertion.num_slots(),
                children.len()
            ));
        }

        let mut subst = Vec::with_capacity(assertion.num_slots());
        for (slot, v) in assertion.mand_vars.iter().enumerate() {
            let ProofNode::Syntax(term) = &children[slot] else {
                return Err(format!(
                    "{} needs a substitution for {}",
                    assertion.label,
                    self.symbols.var(*v).name
                ));
            };
            if term.get_term_type() != self.symbols.var_type(*v) {
                return Err(format!(
                    "{} substitutes {} of the wrong type for {}",
                    assertion.label,
                    term.display(self.symbols),
                    self.symbols.var(*v).name
                ));
            }
            subst.push(Some(term.clone()));
        }

        for (i, hyp) in assertion.log_hyps.iter().enumerate() {
            let child = &children[assertion.log_hyp_slot(i)];
            let expected = assertion.instantiate(hyp, &subst);
            let actual = self.conclusion(child)?;
            if actual != expected {
                return Err(format!(
                    "hypothesis {} of {} should be {} but the proof gives {}",
                    i + 1,
                    assertion.label,
                    expected.display(self.symbols),
                    actual.display(self.symbols)
                ));
            }
        }

        // Distinct variables may never be substituted with expressions that share a variable.
        for pair in &assertion.dj {
            let (Some(x), Some(y)) = (assertion.slot_of_var(pair.0), assertion.slot_of_var(pair.1))
            else {
                continue;
            };
            let (Some(sx), Some(sy)) = (&subst[x], &subst[y]) else {
                continue;
            };
            for v in sx.vars() {
                if sy.contains_var(v) {
                    return Err(format!(
                        "{} requires {} and {} to be distinct, but both contain {}",
                        assertion.label,
                        self.symbols.var(pair.0).name,
                        self.symbols.var(pair.1).name,
                        self.symbols.var(v).name
                    ));
                }
            }
            for w in sx.work_vars() {
                if sy.contains_work_var(w) {
                    return Err(format!(
                        "{} requires {} and {} to be distinct, but both contain {}",
                        assertion.label,
                        self.symbols.var(pair.0).name,
                        self.symbols.var(pair.1).name,
                        self.symbols.work_var_name(w)
                    ));
                }
            }
        }

        Ok(assertion.instantiate(&assertion.formula, &subst))
    }
}
