use std::collections::HashMap;

use crate::kernel::atom::{Atom, SyntaxId, TypeId, VarId, WorkVarId};

/// A type code, along with the prefix used to name its work variables.
#[derive(Clone, Debug)]
pub struct TypeInfo {
    pub name: String,
    pub work_var_prefix: String,
}

/// A syntax axiom builds a term of the result type out of arguments.
#[derive(Clone, Debug)]
pub struct SyntaxAxiom {
    pub label: String,
    pub result: TypeId,
    pub args: Vec<TypeId>,
}

#[derive(Clone, Debug)]
pub struct VarInfo {
    pub name: String,
    pub typ: TypeId,
}

/// The SymbolTable maps between the names used in proof worksheets and the ids used in terms.
/// Types, syntax axioms and variables are all registered here before any formula is parsed.
#[derive(Clone, Debug, Default)]
pub struct SymbolTable {
    types: Vec<TypeInfo>,
    syntax: Vec<SyntaxAxiom>,
    vars: Vec<VarInfo>,

    /// Both syntax labels and variable names live in one namespace.
    name_to_atom: HashMap<String, Atom>,

    name_to_type: HashMap<String, TypeId>,
}

impl SymbolTable {
    pub fn new() -> SymbolTable {
        SymbolTable::default()
    }

    pub fn add_type(&mut self, name: &str, work_var_prefix: &str) -> Result<TypeId, String> {
        if self.name_to_type.contains_key(name) {
            return Err(format!("duplicate type '{}'", name));
        }
        if work_var_prefix.is_empty() {
            return Err(format!("type '{}' has an empty work variable prefix", name));
        }
        let id = self.types.len() as TypeId;
        self.types.push(TypeInfo {
            name: name.to_string(),
            work_var_prefix: work_var_prefix.to_string(),
        });
        self.name_to_type.insert(name.to_string(), id);
        Ok(id)
    }

    pub fn add_syntax(
        &mut self,
        label: &str,
        result: TypeId,
        args: Vec<TypeId>,
    ) -> Result<SyntaxId, String> {
        self.check_new_name(label)?;
        let id = self.syntax.len() as SyntaxId;
        self.syntax.push(SyntaxAxiom {
            label: label.to_string(),
            result,
            args,
        });
        self.name_to_atom.insert(label.to_string(), Atom::Syntax(id));
        Ok(id)
    }

    pub fn add_var(&mut self, name: &str, typ: TypeId) -> Result<VarId, String> {
        self.check_new_name(name)?;
        let id = self.vars.len() as VarId;
        self.vars.push(VarInfo {
            name: name.to_string(),
            typ,
        });
        self.name_to_atom.insert(name.to_string(), Atom::Var(id));
        Ok(id)
    }

    fn check_new_name(&self, name: &str) -> Result<(), String> {
        if self.name_to_atom.contains_key(name) {
            return Err(format!("duplicate name '{}'", name));
        }
        if self.parse_work_var(name).is_some() {
            return Err(format!("'{}' collides with a work variable name", name));
        }
        Ok(())
    }

    pub fn num_types(&self) -> usize {
        self.types.len()
    }

    pub fn type_id(&self, name: &str) -> Option<TypeId> {
        self.name_to_type.get(name).copied()
    }

    pub fn type_name(&self, typ: TypeId) -> &str {
        &self.types[typ as usize].name
    }

    pub fn syntax(&self, id: SyntaxId) -> &SyntaxAxiom {
        &self.syntax[id as usize]
    }

    pub fn var(&self, id: VarId) -> &VarInfo {
        &self.vars[id as usize]
    }

    pub fn var_type(&self, id: VarId) -> TypeId {
        self.vars[id as usize].typ
    }

    /// The type of a term headed by this atom.
    pub fn atom_type(&self, atom: &Atom) -> TypeId {
        match atom {
            Atom::Syntax(i) => self.syntax[*i as usize].result,
            Atom::Var(i) => self.vars[*i as usize].typ,
            Atom::WorkVar(w) => w.typ,
        }
    }

    pub fn work_var_name(&self, w: WorkVarId) -> String {
        format!("{}{}", self.types[w.typ as usize].work_var_prefix, w.number)
    }

    pub fn atom_name(&self, atom: &Atom) -> String {
        match atom {
            Atom::Syntax(i) => self.syntax[*i as usize].label.clone(),
            Atom::Var(i) => self.vars[*i as usize].name.clone(),
            Atom::WorkVar(w) => self.work_var_name(*w),
        }
    }

    /// Work variable names are a type's prefix followed by a positive number.
    pub fn parse_work_var(&self, name: &str) -> Option<WorkVarId> {
        for (typ, info) in self.types.iter().enumerate() {
            if let Some(rest) = name.strip_prefix(info.work_var_prefix.as_str()) {
                if let Ok(number) = rest.parse::<u16>() {
                    if number > 0 && !rest.starts_with('+') {
                        return Some(WorkVarId::new(typ as TypeId, number));
                    }
                }
            }
        }
        None
    }

    pub fn lookup(&self, name: &str) -> Option<Atom> {
        if let Some(atom) = self.name_to_atom.get(name) {
            return Some(*atom);
        }
        self.parse_work_var(name).map(Atom::WorkVar)
    }

    pub fn lookup_var(&self, name: &str) -> Option<VarId> {
        match self.name_to_atom.get(name) {
            Some(Atom::Var(v)) => Some(*v),
            _ => None,
        }
    }
}
