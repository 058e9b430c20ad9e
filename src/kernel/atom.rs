use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies a type code such as wff, setvar or class.
pub type TypeId = u16;

/// Index of a syntax axiom in the symbol table.
/// Syntax ids are assigned in declaration order, so they double as sequence numbers.
pub type SyntaxId = u16;

/// Index of a variable in the symbol table.
pub type VarId = u16;

/// Index of an assertion in the catalog, which is sorted by sequence number.
pub type AssertionId = usize;

/// A work variable is a placeholder for a subformula that is not determined yet.
/// Each type has its own numbered pool.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct WorkVarId {
    pub typ: TypeId,

    /// Numbers start at 1, matching the names shown to users.
    pub number: u16,
}

impl WorkVarId {
    pub fn new(typ: TypeId, number: u16) -> WorkVarId {
        WorkVarId { typ, number }
    }
}

/// An atomic value does not have any internal structure.
/// Every node of a formula tree is headed by one of these.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
pub enum Atom {
    // A syntax axiom, like "wi" for implication. These can have arguments.
    Syntax(SyntaxId),

    // A genuine variable of the logic.
    // Inside an assertion, its mandatory variables are the placeholders that can be substituted.
    Var(VarId),

    // A work variable. Only proof steps contain these.
    WorkVar(WorkVarId),
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Atom::Syntax(i) => write!(f, "s{}", i),
            Atom::Var(i) => write!(f, "v{}", i),
            Atom::WorkVar(w) => write!(f, "w{}_{}", w.typ, w.number),
        }
    }
}

impl Atom {
    pub fn new(s: &str) -> Atom {
        match Atom::parse(s) {
            Some(atom) => atom,
            None => panic!("failed to parse atom: '{}'", s),
        }
    }

    /// Parses the raw form produced by Display.
    pub fn parse(s: &str) -> Option<Atom> {
        let mut chars = s.trim().chars();
        let first = chars.next()?;
        let rest = chars.as_str();
        match first {
            's' => Some(Atom::Syntax(rest.parse().ok()?)),
            'v' => Some(Atom::Var(rest.parse().ok()?)),
            'w' => {
                let (typ, number) = rest.split_once('_')?;
                Some(Atom::WorkVar(WorkVarId::new(
                    typ.parse().ok()?,
                    number.parse().ok()?,
                )))
            }
            _ => None,
        }
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, Atom::Var(_))
    }

    pub fn is_work_var(&self) -> bool {
        matches!(self, Atom::WorkVar(_))
    }

    /// Variables and work variables both take the place of a subformula.
    pub fn is_placeholder(&self) -> bool {
        !matches!(self, Atom::Syntax(_))
    }
}

/// An unordered pair of variables that must stay distinct.
/// The smaller id always comes first.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct DjPair(pub VarId, pub VarId);

impl DjPair {
    pub fn new(a: VarId, b: VarId) -> DjPair {
        if a <= b {
            DjPair(a, b)
        } else {
            DjPair(b, a)
        }
    }

    pub fn contains(&self, v: VarId) -> bool {
        self.0 == v || self.1 == v
    }
}
