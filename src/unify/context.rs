use serde::Serialize;
use tracing::debug;

use crate::catalog::Catalog;
use crate::config::{DjVarsSoftErrors, UnifierConfig};
use crate::error::{Diagnostic, ErrorCode};
use crate::kernel::atom::{DjPair, SyntaxId};
use crate::kernel::fingerprint::{max_depth_of, HiLoKey, ShapeKey};
use crate::kernel::symbol_table::SymbolTable;
use crate::kernel::term::Term;
use crate::worksheet::step::StepId;
use crate::worksheet::work_vars::WorkVarManager;
use crate::worksheet::Worksheet;

/// Counters for one pass, mostly useful for spotting search blowups.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct UnifyStats {
    /// Assertions that were compared against some step.
    pub candidates: usize,

    /// Calls to match one assertion hypothesis against one step hypothesis.
    pub pairwise_attempts: usize,

    pub proofs_built: usize,
    pub work_vars_converted: usize,
}

/// The state shared by every stage of one pass over a worksheet.
pub struct UnifyContext<'a> {
    pub catalog: &'a Catalog,
    pub symbols: &'a SymbolTable,
    pub config: &'a UnifierConfig,

    /// Where auto steps and steps without a Ref look for assertions.
    pub search_list: Vec<usize>,

    /// The restrictions a unification may rely on without reporting them, sorted.
    pub dj_frame: Vec<DjPair>,

    pub work_vars: WorkVarManager,
    pub diagnostics: Vec<Diagnostic>,
    pub stats: UnifyStats,

    /// Soft restriction lists collected while building proofs.
    pub soft_dj_lists: Vec<Vec<DjPair>>,
}

impl<'a> UnifyContext<'a> {
    pub fn new(
        catalog: &'a Catalog,
        symbols: &'a SymbolTable,
        config: &'a UnifierConfig,
        worksheet: &Worksheet,
    ) -> UnifyContext<'a> {
        let search_list =
            catalog.search_list(worksheet.theorem.seq, &config.unify_search_exclude);
        let mut dj_frame = if config.dj_vars_soft_errors == DjVarsSoftErrors::GenerateNew {
            vec![]
        } else {
            worksheet.theorem.dj.clone()
        };
        dj_frame.sort_unstable();
        dj_frame.dedup();
        debug!(
            theorem = worksheet.theorem.label.as_str(),
            candidates = search_list.len(),
            "starting unification"
        );
        UnifyContext {
            catalog,
            symbols,
            config,
            search_list,
            dj_frame,
            work_vars: WorkVarManager::new(symbols, config.work_var_limit),
            diagnostics: vec![],
            stats: UnifyStats::default(),
            soft_dj_lists: vec![],
        }
    }

    pub fn report(&mut self, code: ErrorCode, step: &str, message: String) {
        let diagnostic = Diagnostic::new(code, step, message);
        debug!(%diagnostic, "reported");
        self.diagnostics.push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.code.is_error())
    }
}

/// A snapshot of what unification needs from one derivation step.
/// Formulas are copied out so the worksheet can be updated while a match is in hand.
#[derive(Clone, Debug)]
pub struct StepTarget {
    pub step: StepId,
    pub label: String,
    pub formula: Option<Term>,

    /// Hyp formulas in the step's hyp order. None for a hyp to be derived.
    pub hyps: Vec<Option<Term>>,

    pub derive_formula: bool,
    pub derive_hyps: bool,
    pub has_work_vars: bool,

    pub shape: Option<ShapeKey>,
    pub root: Option<SyntaxId>,
    pub hyps_hi_lo: Option<HiLoKey>,
    pub formula_depth: usize,
    pub hyps_max_depth: usize,
}

impl StepTarget {
    pub fn new(worksheet: &Worksheet, id: StepId) -> StepTarget {
        let step = worksheet.derivation(id);
        let formula = step.formula.clone();
        let hyps = worksheet.hyp_formulas(id);
        StepTarget {
            step: id,
            label: step.label.clone(),
            derive_formula: formula.is_none(),
            derive_hyps: step.hyps_incomplete(),
            has_work_vars: worksheet.has_work_vars_in_step_or_hyps(id),
            shape: formula.as_ref().and_then(|f| f.level_one_two()),
            root: formula.as_ref().and_then(|f| f.head_syntax()),
            hyps_hi_lo: HiLoKey::from_formulas(hyps.iter().map(|h| h.as_ref())),
            formula_depth: formula.as_ref().map(|f| f.max_depth()).unwrap_or(0),
            hyps_max_depth: max_depth_of(hyps.iter().map(|h| h.as_ref())),
            formula,
            hyps,
        }
    }
}
