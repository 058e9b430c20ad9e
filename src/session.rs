use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::catalog::{Assertion, Catalog};
use crate::config::UnifierConfig;
use crate::error::{LoadError, UnifyError};
use crate::kernel::atom::{DjPair, TypeId, VarId};
use crate::kernel::symbol_table::SymbolTable;
use crate::kernel::term::Term;
use crate::unify::{ProofUnifier, UnifyOutcome};
use crate::worksheet::step::{DerivationStep, StepId};
use crate::worksheet::{Theorem, Worksheet};

#[derive(Debug, Deserialize)]
struct TypeDecl {
    name: String,
    work_var_prefix: String,
}

#[derive(Debug, Deserialize)]
struct SyntaxDecl {
    label: String,
    result: String,
    #[serde(default)]
    args: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct VarDecl {
    name: String,
    #[serde(rename = "type")]
    typ: String,
}

#[derive(Debug, Deserialize)]
struct AssertionDecl {
    label: String,
    seq: u32,
    #[serde(default)]
    hyps: Vec<String>,
    formula: String,
    #[serde(default)]
    dj: Vec<[String; 2]>,
}

#[derive(Debug, Deserialize)]
struct TheoremDecl {
    label: String,
    seq: u32,
    #[serde(default)]
    new: bool,
    #[serde(default)]
    dj: Vec<[String; 2]>,

    // When absent, the theorem may use every declared variable.
    variables: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct StepDecl {
    label: String,

    // Present on hypothesis steps only.
    hyp: Option<String>,

    formula: Option<String>,
    #[serde(default)]
    hyps: Vec<String>,
    #[serde(rename = "ref")]
    reference: Option<String>,
    #[serde(default)]
    auto: bool,
}

#[derive(Debug, Deserialize)]
struct SessionFile {
    types: Vec<TypeDecl>,
    #[serde(default)]
    syntax: Vec<SyntaxDecl>,
    #[serde(default)]
    variables: Vec<VarDecl>,
    #[serde(default)]
    assertions: Vec<AssertionDecl>,
    theorem: TheoremDecl,
    steps: Vec<StepDecl>,
    #[serde(default)]
    config: UnifierConfig,
}

/// Everything a unification pass needs, loaded from one JSON file.
pub struct Session {
    pub symbols: SymbolTable,
    pub catalog: Catalog,
    pub worksheet: Worksheet,
    pub config: UnifierConfig,
}

impl Session {
    pub fn load(path: &Path) -> Result<Session, LoadError> {
        let text = fs::read_to_string(path)?;
        Session::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Session, LoadError> {
        let file: SessionFile = serde_json::from_str(text)?;

        let mut symbols = SymbolTable::new();
        for t in &file.types {
            symbols.add_type(&t.name, &t.work_var_prefix)?;
        }
        for s in &file.syntax {
            let result = lookup_type(&symbols, &s.result)?;
            let args = s
                .args
                .iter()
                .map(|a| lookup_type(&symbols, a))
                .collect::<Result<Vec<_>, _>>()?;
            symbols.add_syntax(&s.label, result, args)?;
        }
        for v in &file.variables {
            let typ = lookup_type(&symbols, &v.typ)?;
            symbols.add_var(&v.name, typ)?;
        }

        let mut assertions = vec![];
        for a in &file.assertions {
            let context = format!("assertion {}", a.label);
            let hyps = a
                .hyps
                .iter()
                .map(|h| parse_formula(&symbols, h, &context))
                .collect::<Result<Vec<_>, _>>()?;
            let formula = parse_formula(&symbols, &a.formula, &context)?;
            if formula.has_work_vars() || hyps.iter().any(|h| h.has_work_vars()) {
                return Err(LoadError::Invalid(format!(
                    "{} cannot contain work variables",
                    context
                )));
            }
            let dj = parse_dj(&symbols, &a.dj)?;
            assertions.push(Assertion::new(&a.label, a.seq, hyps, formula, dj));
        }
        let catalog = Catalog::new(assertions)?;

        let vars = match &file.theorem.variables {
            Some(names) => names
                .iter()
                .map(|n| lookup_var(&symbols, n))
                .collect::<Result<Vec<_>, _>>()?,
            None => (0..file.variables.len() as VarId).collect(),
        };
        let theorem = Theorem {
            label: file.theorem.label.clone(),
            seq: file.theorem.seq,
            is_new: file.theorem.new,
            dj: parse_dj(&symbols, &file.theorem.dj)?,
            vars,
        };

        let mut worksheet = Worksheet::new(theorem);
        for step in &file.steps {
            add_step(&mut worksheet, &symbols, &catalog, step)?;
        }
        worksheet.validate(&catalog)?;
        debug!(
            assertions = catalog.len(),
            steps = worksheet.order().len(),
            "loaded session"
        );

        Ok(Session {
            symbols,
            catalog,
            worksheet,
            config: file.config,
        })
    }

    /// Runs a unification pass over the worksheet.
    pub fn unify(&mut self) -> Result<UnifyOutcome, UnifyError> {
        ProofUnifier::new(&self.catalog, &self.symbols, &self.config).unify_all(&mut self.worksheet)
    }
}

fn lookup_type(symbols: &SymbolTable, name: &str) -> Result<TypeId, LoadError> {
    symbols
        .type_id(name)
        .ok_or_else(|| LoadError::Invalid(format!("unknown type '{}'", name)))
}

fn lookup_var(symbols: &SymbolTable, name: &str) -> Result<VarId, LoadError> {
    symbols
        .lookup_var(name)
        .ok_or_else(|| LoadError::Invalid(format!("unknown variable '{}'", name)))
}

fn parse_formula(symbols: &SymbolTable, text: &str, context: &str) -> Result<Term, LoadError> {
    Term::parse(text, symbols).map_err(|e| LoadError::Invalid(format!("{}: {}", context, e)))
}

fn parse_dj(symbols: &SymbolTable, pairs: &[[String; 2]]) -> Result<Vec<DjPair>, LoadError> {
    let mut answer = vec![];
    for [x, y] in pairs {
        let x = lookup_var(symbols, x)?;
        let y = lookup_var(symbols, y)?;
        if x == y {
            return Err(LoadError::Invalid(format!(
                "a variable cannot be distinct from itself: {}",
                symbols.var(x).name
            )));
        }
        answer.push(DjPair::new(x, y));
    }
    answer.sort_unstable();
    answer.dedup();
    Ok(answer)
}

fn add_step(
    ws: &mut Worksheet,
    symbols: &SymbolTable,
    catalog: &Catalog,
    step: &StepDecl,
) -> Result<StepId, LoadError> {
    let context = format!("step {}", step.label);
    if let Some(hyp_label) = &step.hyp {
        let Some(text) = &step.formula else {
            return Err(LoadError::Invalid(format!("{} needs a formula", context)));
        };
        let formula = parse_formula(symbols, text, &context)?;
        if formula.has_work_vars() {
            return Err(LoadError::Invalid(format!(
                "{} is a hypothesis and cannot contain work variables",
                context
            )));
        }
        // A new theorem's hypotheses don't have labels yet.
        let hyp_label = if ws.theorem.is_new || hyp_label.is_empty() {
            None
        } else {
            Some(hyp_label.as_str())
        };
        return Ok(ws.add_hypothesis(&step.label, hyp_label, formula)?);
    }

    let formula = match &step.formula {
        Some(text) => Some(parse_formula(symbols, text, &context)?),
        None => None,
    };
    let mut hyps = vec![];
    for label in &step.hyps {
        if label == "?" {
            hyps.push(None);
            continue;
        }
        match ws.find_step(label) {
            Some(id) => hyps.push(Some(id)),
            None => {
                return Err(LoadError::Invalid(format!(
                    "{} refers to unknown step '{}'",
                    context, label
                )))
            }
        }
    }
    let reference = match &step.reference {
        Some(label) => Some(catalog.lookup(label).ok_or_else(|| {
            LoadError::Invalid(format!("{} cites unknown assertion '{}'", context, label))
        })?),
        None => None,
    };
    let mut d = DerivationStep::new(&step.label, formula, hyps, reference);
    d.auto_step = step.auto;
    Ok(ws.add_derivation(d)?)
}
