use tracing::trace;

use crate::error::UnifyError;
use crate::kernel::atom::{Atom, TypeId, WorkVarId};
use crate::kernel::symbol_table::SymbolTable;
use crate::kernel::term::Term;

// The work variables of one type.
// Index i holds work variable number i + 1.
#[derive(Clone, Debug)]
struct Pool {
    allocated: Vec<bool>,
    bindings: Vec<Option<Term>>,

    // Allocation continues after the most recently allocated index.
    last_alloc: Option<usize>,
}

/// Tracks which work variables are in use and what they are bound to.
///
/// Bindings survive deallocation. When unification binds a work variable it is
/// deallocated, and steps that mention it are rewritten through its binding before
/// anything else gets allocated.
#[derive(Clone, Debug)]
pub struct WorkVarManager {
    limit: u16,
    type_names: Vec<String>,
    pools: Vec<Pool>,
}

impl WorkVarManager {
    pub fn new(symbols: &SymbolTable, limit: u16) -> WorkVarManager {
        let num_types = symbols.num_types();
        let type_names = (0..num_types)
            .map(|t| symbols.type_name(t as TypeId).to_string())
            .collect();
        let pools = (0..num_types)
            .map(|_| Pool {
                allocated: vec![false; limit as usize],
                bindings: vec![None; limit as usize],
                last_alloc: None,
            })
            .collect();
        WorkVarManager {
            limit,
            type_names,
            pools,
        }
    }

    fn index(&self, w: WorkVarId) -> Option<(usize, usize)> {
        let typ = w.typ as usize;
        if typ >= self.pools.len() || w.number == 0 || w.number > self.limit {
            return None;
        }
        Some((typ, w.number as usize - 1))
    }

    /// Marks a work variable that already appears in the worksheet as in use.
    pub fn register(&mut self, w: WorkVarId) -> Result<(), String> {
        match self.index(w) {
            Some((typ, i)) => {
                self.pools[typ].allocated[i] = true;
                Ok(())
            }
            None => Err(format!(
                "work variable number {} is outside the limit of {}",
                w.number, self.limit
            )),
        }
    }

    /// Allocates an unused work variable of the given type, with no binding.
    pub fn alloc(&mut self, typ: TypeId) -> Result<WorkVarId, UnifyError> {
        let limit = self.limit as usize;
        let pool = &mut self.pools[typ as usize];
        let start = pool.last_alloc.map(|i| i + 1).unwrap_or(0);
        for offset in 0..limit {
            let i = (start + offset) % limit;
            if !pool.allocated[i] {
                pool.allocated[i] = true;
                pool.bindings[i] = None;
                pool.last_alloc = Some(i);
                let w = WorkVarId::new(typ, i as u16 + 1);
                trace!(work_var = %Atom::WorkVar(w), "allocated");
                return Ok(w);
            }
        }
        Err(UnifyError::WorkVarsExhausted {
            type_name: self.type_names[typ as usize].clone(),
            limit: self.limit,
        })
    }

    pub fn dealloc(&mut self, w: WorkVarId) {
        if let Some((typ, i)) = self.index(w) {
            self.pools[typ].allocated[i] = false;
        }
    }

    pub fn is_allocated(&self, w: WorkVarId) -> bool {
        match self.index(w) {
            Some((typ, i)) => self.pools[typ].allocated[i],
            None => false,
        }
    }

    pub fn binding(&self, w: WorkVarId) -> Option<&Term> {
        let (typ, i) = self.index(w)?;
        self.pools[typ].bindings[i].as_ref()
    }

    pub fn bind(&mut self, w: WorkVarId, term: Term) {
        if let Some((typ, i)) = self.index(w) {
            self.pools[typ].bindings[i] = Some(term);
        }
    }

    pub fn unbind(&mut self, w: WorkVarId) {
        if let Some((typ, i)) = self.index(w) {
            self.pools[typ].bindings[i] = None;
        }
    }

    /// Replaces every bound work variable in the term by its resolved binding.
    pub fn resolve(&self, term: &Term) -> Term {
        term.replace_leaves(&|atom| match atom {
            Atom::WorkVar(w) => self.binding(*w).map(|b| self.resolve(b)),
            _ => None,
        })
    }

    /// Fully resolves the binding of every allocated, bound work variable and deallocates it.
    /// Returns the work variables that were updated.
    pub fn resolve_updates(&mut self) -> Vec<WorkVarId> {
        let mut updated = vec![];
        for typ in 0..self.pools.len() {
            for i in (0..self.limit as usize).rev() {
                if !self.pools[typ].allocated[i] {
                    continue;
                }
                let Some(binding) = &self.pools[typ].bindings[i] else {
                    continue;
                };
                let resolved = self.resolve(binding);
                self.pools[typ].bindings[i] = Some(resolved);
                self.pools[typ].allocated[i] = false;
                updated.push(WorkVarId::new(typ as TypeId, i as u16 + 1));
            }
        }
        updated
    }
}
