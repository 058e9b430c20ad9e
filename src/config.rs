use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// What to do with distinct variable violations that could be fixed by adding restrictions.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DjVarsSoftErrors {
    /// Don't collect them.
    Ignore,

    /// Report them as errors. Autocomplete results that need them are reported, not applied.
    Report,

    /// Declare the theorem's restrictions plus the missing ones.
    GenerateReplacements,

    /// Declare just the missing restrictions that the theorem does not already have.
    #[default]
    GenerateDifferences,

    /// Check against an empty frame and declare everything that is needed.
    GenerateNew,
}

impl DjVarsSoftErrors {
    pub fn is_generate(&self) -> bool {
        matches!(
            self,
            DjVarsSoftErrors::GenerateReplacements
                | DjVarsSoftErrors::GenerateDifferences
                | DjVarsSoftErrors::GenerateNew
        )
    }
}

impl FromStr for DjVarsSoftErrors {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ignore" => Ok(DjVarsSoftErrors::Ignore),
            "report" => Ok(DjVarsSoftErrors::Report),
            "generate_replacements" => Ok(DjVarsSoftErrors::GenerateReplacements),
            "generate_differences" => Ok(DjVarsSoftErrors::GenerateDifferences),
            "generate_new" => Ok(DjVarsSoftErrors::GenerateNew),
            _ => Err(format!("unknown dj vars soft error mode: {}", s)),
        }
    }
}

impl fmt::Display for DjVarsSoftErrors {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            DjVarsSoftErrors::Ignore => "ignore",
            DjVarsSoftErrors::Report => "report",
            DjVarsSoftErrors::GenerateReplacements => "generate_replacements",
            DjVarsSoftErrors::GenerateDifferences => "generate_differences",
            DjVarsSoftErrors::GenerateNew => "generate_new",
        };
        write!(f, "{}", name)
    }
}

/// Settings for a unification pass.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct UnifierConfig {
    pub dj_vars_soft_errors: DjVarsSoftErrors,

    /// Whether to verify each proof we build with the independent checker.
    pub recheck_proofs: bool,

    /// Whether work variables left in the qed step get replaced by unused optional variables.
    pub convert_work_vars: bool,

    /// How many work variables each type has.
    pub work_var_limit: u16,

    /// Labels that the search for steps without a Ref never offers.
    /// An entry ending in '*' excludes every label with that prefix.
    pub unify_search_exclude: Vec<String>,
}

impl Default for UnifierConfig {
    fn default() -> Self {
        UnifierConfig {
            dj_vars_soft_errors: DjVarsSoftErrors::default(),
            recheck_proofs: true,
            convert_work_vars: true,
            work_var_limit: 200,
            unify_search_exclude: vec![],
        }
    }
}
