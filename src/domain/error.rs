//! Domain error types.

/// A parse error with position information for rule expressions.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("parse error at position {position}: {message}")]
pub struct ParseError {
    pub message: String,
    pub position: usize,
}

impl ParseError {
    /// Format the error with a caret pointing at the error position in the input.
    pub fn display_with_context(&self, input: &str) -> String {
        let column = input
            .get(..self.position)
            .map(|prefix| prefix.chars().count())
            .unwrap_or(self.position);
        let caret = " ".repeat(column) + "^";
        format!(
            "{input}\n{caret}\n{err}",
            input = input,
            caret = caret,
            err = self
        )
    }
}

/// Failure while evaluating a compiled expression against one row.
///
/// Never escapes a rule match: the rule set treats it as "does not match".
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error("unknown variable '{0}'")]
    UnknownVariable(String),

    #[error("cannot compare {left} {op} {right}")]
    TypeMismatch {
        left: &'static str,
        op: &'static str,
        right: &'static str,
    },
}

/// Top-level error type for kryptosignal.
#[derive(Debug, thiserror::Error)]
pub enum KryptoError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    RuleParse(#[from] ParseError),

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("export error: {reason}")]
    Export { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&KryptoError> for std::process::ExitCode {
    fn from(err: &KryptoError) -> Self {
        let code: u8 = match err {
            KryptoError::Io(_) => 1,
            KryptoError::ConfigParse { .. }
            | KryptoError::ConfigMissing { .. }
            | KryptoError::ConfigInvalid { .. } => 2,
            KryptoError::Data { .. } => 3,
            KryptoError::RuleParse(_) => 4,
            KryptoError::Export { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
