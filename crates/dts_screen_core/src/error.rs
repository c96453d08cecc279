use std::fmt;
use std::io;
use std::path::PathBuf;

/// Errors raised while building or driving a parameter screen
#[derive(Debug)]
pub enum ScreenError {
    /// The template contains no parameter definitions, so there is nothing to sweep
    NoParameters,
    /// A parameter definition could not be parsed
    Validation {
        parameter: String,
        definition: String,
        reason: ValidationReason,
    },
    /// The backend driver executable is missing or not invocable
    BackendUnavailable {
        driver: String,
        hint: &'static str,
        detail: String,
    },
    /// An argument string has unbalanced quotes or a dangling escape
    Arguments {
        args: String,
        source: shell_words::ParseError,
    },
    /// Filesystem failure at a known path
    Io { path: PathBuf, source: io::Error },
    /// Manifest or params serialization failure
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Why a range definition was rejected
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationReason {
    /// Range does not have exactly `start:end:step`
    FieldCount(usize),
    /// One of the range fields is not a finite number
    NotNumeric(String),
    /// Step is zero or negative
    NonPositiveStep(f64),
    /// Adding the step no longer changes the value at this magnitude
    StepBelowPrecision { step: f64, value: f64 },
}

impl fmt::Display for ValidationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationReason::FieldCount(n) => write!(
                f,
                "range definition must have format 'start:end:step', found {n} field(s)"
            ),
            ValidationReason::NotNumeric(field) => {
                write!(f, "invalid range value '{field}'")
            }
            ValidationReason::NonPositiveStep(step) => {
                write!(f, "step must be positive, got {step}")
            }
            ValidationReason::StepBelowPrecision { step, value } => {
                write!(f, "step {step} is too small to advance past {value}")
            }
        }
    }
}

impl fmt::Display for ScreenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScreenError::NoParameters => write!(f, "no parameters found in template file"),
            ScreenError::Validation {
                parameter,
                definition,
                reason,
            } => write!(
                f,
                "invalid definition for parameter '{parameter}' ({definition}): {reason}"
            ),
            ScreenError::BackendUnavailable {
                driver,
                hint,
                detail,
            } => write!(f, "{driver} not available ({detail}). {hint}"),
            ScreenError::Arguments { args, source } => {
                write!(f, "could not split arguments `{args}`: {source}")
            }
            ScreenError::Io { path, source } => {
                write!(f, "I/O error at {}: {source}", path.display())
            }
            ScreenError::Json { path, source } => {
                write!(f, "JSON error in {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ScreenError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScreenError::Io { source, .. } => Some(source),
            ScreenError::Json { source, .. } => Some(source),
            ScreenError::Arguments { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl ScreenError {
    /// Attach a path to an I/O error
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ScreenError::Io {
            path: path.into(),
            source,
        }
    }

    /// Attach a path to a JSON error
    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        ScreenError::Json {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ScreenError>;
