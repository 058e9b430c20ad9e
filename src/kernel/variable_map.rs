use crate::kernel::atom::VarId;
use crate::kernel::term::Term;

/// The bindings produced by matching one assertion formula against one concrete formula.
/// Each entry is (substitution slot, bound term), in slot order.
pub type Fragment = Vec<(usize, Term)>;

// A VariableMap maintains a mapping from an assertion's mandatory variables to terms.
// Slot i corresponds to the i-th mandatory variable, in VarId order.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct VariableMap<'a> {
    mand_vars: &'a [VarId],
    map: Vec<Option<Term>>,
}

impl<'a> VariableMap<'a> {
    /// The mandatory variables must be sorted.
    pub fn new(mand_vars: &'a [VarId]) -> VariableMap<'a> {
        VariableMap {
            mand_vars,
            map: vec![None; mand_vars.len()],
        }
    }

    pub fn get_mapping(&self, slot: usize) -> Option<&Term> {
        self.map.get(slot).and_then(|opt| opt.as_ref())
    }

    fn slot_of(&self, v: VarId) -> Option<usize> {
        self.mand_vars.binary_search(&v).ok()
    }

    pub fn match_var(&mut self, slot: usize, special_term: &Term) -> bool {
        match &self.map[slot] {
            None => {
                self.map[slot] = Some(special_term.clone());
                true
            }
            Some(general_term) => general_term == special_term,
        }
    }

    /// First-order matching where only the mandatory variables of the general term may be bound.
    /// Everything else, including other variables, has to match exactly.
    pub fn match_terms(&mut self, general: &Term, special: &Term) -> bool {
        if general.get_term_type() != special.get_term_type() {
            return false;
        }

        if let Some(v) = general.atomic_variable() {
            if let Some(slot) = self.slot_of(v) {
                return self.match_var(slot, special);
            }
        }

        if general.get_head() != special.get_head() {
            return false;
        }
        if general.args().len() != special.args().len() {
            return false;
        }
        for (g, s) in general.args().iter().zip(special.args().iter()) {
            if !self.match_terms(g, s) {
                return false;
            }
        }
        true
    }

    pub fn into_fragment(self) -> Fragment {
        self.map
            .into_iter()
            .enumerate()
            .filter_map(|(i, opt)| opt.map(|term| (i, term)))
            .collect()
    }
}

/// Matches an assertion tree against a concrete tree.
/// On success, returns the bindings for the mandatory variables that occur in the assertion tree.
/// The returned slots index into `mand_vars`.
pub fn unify_subtree(general: &Term, special: &Term, mand_vars: &[VarId]) -> Option<Fragment> {
    let mut map = VariableMap::new(mand_vars);
    if map.match_terms(general, special) {
        Some(map.into_fragment())
    } else {
        None
    }
}

/// The substitution being built for one assertion.
/// Slots parallel the assertion's hypothesis array. Variable slots hold the bound subterms,
/// and logical hypothesis slots stay empty until a proof is assembled.
///
/// Each backtracking level remembers which slots it set, so a failed branch can be
/// unwound without rebuilding the whole table.
#[derive(Debug, Clone)]
pub struct SubstTable {
    slots: Vec<Option<Term>>,
    undo: Vec<Vec<usize>>,
}

impl SubstTable {
    pub fn new(num_slots: usize) -> SubstTable {
        SubstTable {
            slots: vec![None; num_slots],
            undo: vec![],
        }
    }

    /// A table holding the bindings from the formula match, which no level owns.
    pub fn with_fragment(num_slots: usize, fragment: &Fragment) -> SubstTable {
        let mut table = SubstTable::new(num_slots);
        for (slot, term) in fragment {
            table.slots[*slot] = Some(term.clone());
        }
        table
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn get(&self, slot: usize) -> Option<&Term> {
        self.slots[slot].as_ref()
    }

    pub fn slots(&self) -> &[Option<Term>] {
        &self.slots
    }

    pub fn into_slots(self) -> Vec<Option<Term>> {
        self.slots
    }

    /// Merges a fragment as the sole contribution of this level.
    /// A slot that is already bound must be bound to an identical term.
    /// On a conflict, everything this level set is undone and false is returned.
    pub fn merge(&mut self, level: usize, fragment: &Fragment) -> bool {
        if self.undo.len() <= level {
            self.undo.resize(level + 1, vec![]);
        }
        self.undo[level].clear();
        for (slot, term) in fragment {
            match &self.slots[*slot] {
                None => {
                    self.slots[*slot] = Some(term.clone());
                    self.undo[level].push(*slot);
                }
                Some(existing) => {
                    if existing != term {
                        self.undo_level(level);
                        return false;
                    }
                }
            }
        }
        true
    }

    pub fn undo_level(&mut self, level: usize) {
        if let Some(cleanup) = self.undo.get_mut(level) {
            for slot in cleanup.drain(..) {
                self.slots[slot] = None;
            }
        }
    }
}
