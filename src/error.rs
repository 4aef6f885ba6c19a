use thiserror::Error;

/// Errors raised while rendering a rule. All of them abort the rule being
/// formatted; the driver wraps leaf errors with the name of the offending
/// expression so the failing statement can be located in long rules.
#[derive(Error, Debug)]
pub enum FormatError {
    #[error("no encoder is registered for the expression '{0}'")]
    UnknownExpression(String),

    #[error("register {0} is read before any expression wrote to it")]
    EmptyRegister(u32),

    #[error("invalid destination register {0}")]
    InvalidDestRegister(u32),

    #[error("a data expression may not write to the verdict register")]
    VerdictRegisterWrite,

    #[error("the set '{name}' was not found in table '{table}'")]
    SetNotFound { table: String, name: String },

    #[error("refreshing the set cache from the kernel failed")]
    SetRefresh(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("failed to encode the {kind} expression")]
    Expression {
        kind: &'static str,
        #[source]
        source: Box<FormatError>,
    },
}

impl FormatError {
    /// Wraps an error with the name of the expression it surfaced in.
    pub(crate) fn in_expr(self, kind: &'static str) -> Self {
        FormatError::Expression {
            kind,
            source: Box::new(self),
        }
    }
}
