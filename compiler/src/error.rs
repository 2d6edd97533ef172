//! The compiler's fatal error kinds.
//!
//! Every error is terminal: there is no recovery, matching the front end's
//! one-shot, no-optimization-pass austerity. A span is attached whenever the
//! failure can be pinned to a specific source location.

use diagnostics::SourceSpan;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("{path}: source file not found")]
    IoMissing { path: String },

    #[error("{message}")]
    Parse {
        message: String,
        span: Option<SourceSpan>,
    },

    #[error("{message}")]
    ResolveCycle { message: String },

    #[error("unknown symbol `{name}`")]
    UnknownSymbol {
        name: String,
        span: Option<SourceSpan>,
    },

    #[error("{message}")]
    TypeLayout {
        message: String,
        span: Option<SourceSpan>,
    },

    #[error("unsupported construct: {message}")]
    UnsupportedConstruct {
        message: String,
        span: Option<SourceSpan>,
    },

    #[error("invalid assignment target: {message}")]
    BadAssignmentTarget {
        message: String,
        span: Option<SourceSpan>,
    },

    #[error("intrinsic misuse: {message}")]
    IntrinsicMisuse {
        message: String,
        span: Option<SourceSpan>,
    },
}

impl CompileError {
    pub fn span(&self) -> Option<&SourceSpan> {
        match self {
            CompileError::IoMissing { .. } => None,
            CompileError::Parse { span, .. }
            | CompileError::UnknownSymbol { span, .. }
            | CompileError::TypeLayout { span, .. }
            | CompileError::UnsupportedConstruct { span, .. }
            | CompileError::BadAssignmentTarget { span, .. }
            | CompileError::IntrinsicMisuse { span, .. } => span.as_ref(),
            CompileError::ResolveCycle { .. } => None,
        }
    }

    pub fn unknown_symbol(name: impl Into<String>) -> Self {
        CompileError::UnknownSymbol {
            name: name.into(),
            span: None,
        }
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        CompileError::UnsupportedConstruct {
            message: message.into(),
            span: None,
        }
    }

    pub fn bad_assignment_target(message: impl Into<String>) -> Self {
        CompileError::BadAssignmentTarget {
            message: message.into(),
            span: None,
        }
    }

    pub fn intrinsic_misuse(message: impl Into<String>) -> Self {
        CompileError::IntrinsicMisuse {
            message: message.into(),
            span: None,
        }
    }

    pub fn type_layout(message: impl Into<String>) -> Self {
        CompileError::TypeLayout {
            message: message.into(),
            span: None,
        }
    }

    pub fn resolve_cycle(message: impl Into<String>) -> Self {
        CompileError::ResolveCycle {
            message: message.into(),
        }
    }
}
