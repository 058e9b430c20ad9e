use std::fmt;
use std::io;

use serde::Serialize;

/// Codes for the messages a unification pass reports.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
pub enum ErrorCode {
    /// The step's Ref does not unify with the step.
    RefUnify,

    /// No assertion unifies with a step that has no Ref.
    StepUnify,

    /// The step unified, but some of its hypotheses are incomplete.
    IncompleteHyps,

    /// The chosen assertion violates a distinct variable restriction.
    DjVarsVerify,

    /// A built proof failed the independent recheck.
    VerifyRecheck,

    /// Other assertions that also unify with the step.
    AlternateRefs,

    /// Work variables remain and conversion to dummy variables is disabled.
    NoConvertWorkVars,

    /// An auto step could be completed if distinct variable restrictions were added.
    PossibleSubst,
}

impl ErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCode::RefUnify => "E-PA-0410",
            ErrorCode::StepUnify => "I-PA-0411",
            ErrorCode::IncompleteHyps => "I-PA-0403",
            ErrorCode::DjVarsVerify => "E-PA-0409",
            ErrorCode::VerifyRecheck => "E-PA-0405",
            ErrorCode::AlternateRefs => "I-PA-0402",
            ErrorCode::NoConvertWorkVars => "I-PA-0418",
            ErrorCode::PossibleSubst => "I-PA-0419",
        }
    }

    pub fn is_error(&self) -> bool {
        self.code().starts_with('E')
    }
}

/// A non-fatal message tied to a proof step.
/// A pass keeps going after reporting one, so a single run shows every problem it can find.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub code: ErrorCode,
    pub step: Option<String>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(code: ErrorCode, step: &str, message: String) -> Diagnostic {
        Diagnostic {
            code,
            step: Some(step.to_string()),
            message,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.step {
            Some(step) => write!(f, "{} Step {}: {}", self.code.code(), step, self.message),
            None => write!(f, "{} {}", self.code.code(), self.message),
        }
    }
}

/// Errors that abort a whole unification pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnifyError {
    /// Converting work variables needs more unused optional variables of a type than the
    /// theorem has.
    DummyVarShortage {
        theorem: String,
        type_name: String,
        available: usize,
    },

    /// Every work variable of a type is in use.
    WorkVarsExhausted { type_name: String, limit: u16 },
}

impl fmt::Display for UnifyError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            UnifyError::DummyVarShortage {
                theorem,
                type_name,
                available,
            } => write!(
                f,
                "E-PA-0415 Theorem {}: cannot convert work variables to dummy variables, \
                 only {} unused optional variables of type {}",
                theorem, available, type_name
            ),
            UnifyError::WorkVarsExhausted { type_name, limit } => write!(
                f,
                "all {} work variables of type {} are in use",
                limit, type_name
            ),
        }
    }
}

impl From<UnifyError> for String {
    fn from(error: UnifyError) -> Self {
        error.to_string()
    }
}

/// Errors loading a session.
#[derive(Debug)]
pub enum LoadError {
    Io(String),
    Json(String),

    // The session parsed, but its contents are inconsistent.
    Invalid(String),
}

impl From<io::Error> for LoadError {
    fn from(error: io::Error) -> Self {
        LoadError::Io(format!("{}", error))
    }
}

impl From<serde_json::Error> for LoadError {
    fn from(error: serde_json::Error) -> Self {
        LoadError::Json(format!("{}", error))
    }
}

impl From<String> for LoadError {
    fn from(message: String) -> Self {
        LoadError::Invalid(message)
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LoadError::Io(message) => write!(f, "io error: {}", message),
            LoadError::Json(message) => write!(f, "bad json: {}", message),
            LoadError::Invalid(message) => write!(f, "{}", message),
        }
    }
}

impl From<LoadError> for String {
    fn from(error: LoadError) -> Self {
        error.to_string()
    }
}
