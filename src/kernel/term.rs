use std::fmt;

use crate::kernel::atom::{Atom, SyntaxId, TypeId, VarId, WorkVarId};
use crate::kernel::symbol_table::SymbolTable;

/// A Term is a formula tree: a syntax axiom applied to argument terms, or a leaf.
/// Leaves are variables, work variables, or syntax axioms with no arguments.
#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Term {
    /// The type of the entire term, like wff or class.
    term_type: TypeId,

    head: Atom,
    args: Vec<Term>,
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}",
            TermFormatter {
                term: self,
                symbols: None
            }
        )
    }
}

/// Formats terms with raw ids, or with names when a symbol table is available.
pub struct TermFormatter<'a> {
    term: &'a Term,
    symbols: Option<&'a SymbolTable>,
}

impl fmt::Display for TermFormatter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.symbols {
            Some(symbols) => write!(f, "{}", symbols.atom_name(&self.term.head))?,
            None => write!(f, "{}", self.term.head)?,
        }
        if !self.term.args.is_empty() {
            write!(f, "(")?;
            for (i, arg) in self.term.args.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(
                    f,
                    "{}",
                    TermFormatter {
                        term: arg,
                        symbols: self.symbols
                    }
                )?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

impl Term {
    pub fn new(term_type: TypeId, head: Atom, args: Vec<Term>) -> Term {
        Term {
            term_type,
            head,
            args,
        }
    }

    pub fn atom(term_type: TypeId, atom: Atom) -> Term {
        Term::new(term_type, atom, vec![])
    }

    pub fn var(term_type: TypeId, v: VarId) -> Term {
        Term::atom(term_type, Atom::Var(v))
    }

    pub fn work_var(w: WorkVarId) -> Term {
        Term::atom(w.typ, Atom::WorkVar(w))
    }

    pub fn get_term_type(&self) -> TypeId {
        self.term_type
    }

    pub fn get_head(&self) -> &Atom {
        &self.head
    }

    pub fn args(&self) -> &[Term] {
        &self.args
    }

    pub fn is_atomic(&self) -> bool {
        self.args.is_empty()
    }

    pub fn atomic_variable(&self) -> Option<VarId> {
        match self.head {
            Atom::Var(v) if self.args.is_empty() => Some(v),
            _ => None,
        }
    }

    pub fn atomic_work_var(&self) -> Option<WorkVarId> {
        match self.head {
            Atom::WorkVar(w) if self.args.is_empty() => Some(w),
            _ => None,
        }
    }

    pub fn head_syntax(&self) -> Option<SyntaxId> {
        match self.head {
            Atom::Syntax(s) => Some(s),
            _ => None,
        }
    }

    pub fn display<'a>(&'a self, symbols: &'a SymbolTable) -> TermFormatter<'a> {
        TermFormatter {
            term: self,
            symbols: Some(symbols),
        }
    }

    /// Work variables count as depth zero, since they can stand for anything.
    pub fn max_depth(&self) -> usize {
        if self.head.is_work_var() {
            return 0;
        }
        1 + self.args.iter().map(|a| a.max_depth()).max().unwrap_or(0)
    }

    pub fn node_count(&self) -> usize {
        1 + self.args.iter().map(|a| a.node_count()).sum::<usize>()
    }

    /// The root syntax axiom and the heads of its children.
    /// None when a variable appears in the first two levels, since then the
    /// shape depends on the substitution.
    pub fn level_one_two(&self) -> Option<(SyntaxId, Vec<SyntaxId>)> {
        let root = self.head_syntax()?;
        if self.args.is_empty() {
            return None;
        }
        let mut children = Vec::with_capacity(self.args.len());
        for arg in &self.args {
            children.push(arg.head_syntax()?);
        }
        Some((root, children))
    }

    /// All syntax labels in the tree, sorted.
    pub fn syntax_multiset(&self) -> Vec<SyntaxId> {
        let mut answer = vec![];
        self.push_syntax(&mut answer);
        answer.sort_unstable();
        answer
    }

    fn push_syntax(&self, output: &mut Vec<SyntaxId>) {
        if let Atom::Syntax(s) = self.head {
            output.push(s);
        }
        for arg in &self.args {
            arg.push_syntax(output);
        }
    }

    pub fn has_work_vars(&self) -> bool {
        self.head.is_work_var() || self.args.iter().any(|a| a.has_work_vars())
    }

    pub fn contains_work_var(&self, w: WorkVarId) -> bool {
        self.head == Atom::WorkVar(w) || self.args.iter().any(|a| a.contains_work_var(w))
    }

    pub fn contains_var(&self, v: VarId) -> bool {
        self.head == Atom::Var(v) || self.args.iter().any(|a| a.contains_var(v))
    }

    /// Appends work variables not already in the output, in order of first appearance.
    pub fn collect_work_vars(&self, output: &mut Vec<WorkVarId>) {
        if let Atom::WorkVar(w) = self.head {
            if !output.contains(&w) {
                output.push(w);
            }
        }
        for arg in &self.args {
            arg.collect_work_vars(output);
        }
    }

    pub fn work_vars(&self) -> Vec<WorkVarId> {
        let mut answer = vec![];
        self.collect_work_vars(&mut answer);
        answer
    }

    /// Appends variables not already in the output, in order of first appearance.
    pub fn collect_vars(&self, output: &mut Vec<VarId>) {
        if let Atom::Var(v) = self.head {
            if !output.contains(&v) {
                output.push(v);
            }
        }
        for arg in &self.args {
            arg.collect_vars(output);
        }
    }

    /// Like collect_vars, but remembers the type each variable occurs with.
    pub fn collect_typed_vars(&self, output: &mut Vec<(VarId, TypeId)>) {
        if let Atom::Var(v) = self.head {
            if !output.iter().any(|(x, _)| *x == v) {
                output.push((v, self.term_type));
            }
        }
        for arg in &self.args {
            arg.collect_typed_vars(output);
        }
    }

    pub fn vars(&self) -> Vec<VarId> {
        let mut answer = vec![];
        self.collect_vars(&mut answer);
        answer
    }

    /// Replaces leaves according to the provided function.
    /// Leaves for which it returns None are kept as they are.
    pub fn replace_leaves<F>(&self, f: &F) -> Term
    where
        F: Fn(&Atom) -> Option<Term>,
    {
        if self.args.is_empty() {
            if let Some(replacement) = f(&self.head) {
                return replacement;
            }
            return self.clone();
        }
        Term {
            term_type: self.term_type,
            head: self.head,
            args: self.args.iter().map(|a| a.replace_leaves(f)).collect(),
        }
    }

    /// The reverse Polish form: arguments first, then the head.
    pub fn to_rpn(&self) -> Vec<Atom> {
        let mut answer = vec![];
        self.push_rpn(&mut answer);
        answer
    }

    fn push_rpn(&self, output: &mut Vec<Atom>) {
        for arg in &self.args {
            arg.push_rpn(output);
        }
        output.push(self.head);
    }

    /// Parses prefix syntax like "wi(ph, wi(ps, ph))".
    /// Identifiers resolve to variables, work variables, or syntax axioms.
    pub fn parse(s: &str, symbols: &SymbolTable) -> Result<Term, String> {
        let mut parser = TermParser {
            input: s.as_bytes(),
            pos: 0,
            symbols,
        };
        let term = parser.parse_term()?;
        parser.skip_whitespace();
        if parser.pos < parser.input.len() {
            return Err(format!("unexpected trailing input in '{}'", s));
        }
        Ok(term)
    }
}

struct TermParser<'a> {
    input: &'a [u8],
    pos: usize,
    symbols: &'a SymbolTable,
}

impl TermParser<'_> {
    fn skip_whitespace(&mut self) {
        while self.pos < self.input.len() && self.input[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn peek(&mut self) -> Option<u8> {
        self.skip_whitespace();
        self.input.get(self.pos).copied()
    }

    fn parse_identifier(&mut self) -> Result<String, String> {
        self.skip_whitespace();
        let start = self.pos;
        while self.pos < self.input.len() {
            let c = self.input[self.pos];
            if c.is_ascii_whitespace() || c == b'(' || c == b')' || c == b',' {
                break;
            }
            self.pos += 1;
        }
        if start == self.pos {
            return Err(format!("expected an identifier at offset {}", start));
        }
        Ok(String::from_utf8_lossy(&self.input[start..self.pos]).into_owned())
    }

    fn parse_term(&mut self) -> Result<Term, String> {
        let name = self.parse_identifier()?;
        let head = self
            .symbols
            .lookup(&name)
            .ok_or_else(|| format!("unknown symbol '{}'", name))?;
        let term_type = self.symbols.atom_type(&head);

        let mut args = vec![];
        if self.peek() == Some(b'(') {
            self.pos += 1;
            loop {
                args.push(self.parse_term()?);
                match self.peek() {
                    Some(b',') => self.pos += 1,
                    Some(b')') => {
                        self.pos += 1;
                        break;
                    }
                    _ => return Err(format!("expected ',' or ')' after argument of '{}'", name)),
                }
            }
        }

        match head {
            Atom::Syntax(s) => {
                let expected = &self.symbols.syntax(s).args;
                if expected.len() != args.len() {
                    return Err(format!(
                        "'{}' takes {} arguments but got {}",
                        name,
                        expected.len(),
                        args.len()
                    ));
                }
                for (i, (arg, typ)) in args.iter().zip(expected.iter()).enumerate() {
                    if arg.get_term_type() != *typ {
                        return Err(format!(
                            "argument {} of '{}' should have type {}",
                            i,
                            name,
                            self.symbols.type_name(*typ)
                        ));
                    }
                }
            }
            _ => {
                if !args.is_empty() {
                    return Err(format!("variable '{}' cannot take arguments", name));
                }
            }
        }
        Ok(Term::new(term_type, head, args))
    }
}
