//! Lowering errors.
//!
//! Every error is fatal for the whole crate being lowered. The
//! [`ErrorCategory`] says whose fault it is.

use tern_ir::Span;
use tern_vir::IrError;
use thiserror::Error;

/// Coarse classification of a [`LowerError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// The construct is outside the lowered subset of the language.
    Unsupported,
    /// An upstream stage or the lowering itself broke an invariant.
    Invariant,
    /// A construct appeared where its context does not allow it
    /// (`break` outside a loop, dereferencing a non-pointer, ...).
    ControlContext,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LowerError {
    // Unsupported
    #[error("{span}: {what} is not supported by lowering")]
    Unsupported { what: &'static str, span: Span },

    #[error("{span}: qualified path `{path}` is not supported by lowering")]
    QualifiedPath { path: String, span: Span },

    #[error("{span}: cannot cast `{from}` to `{to}`")]
    UnsupportedCast { from: String, to: String, span: Span },

    // Invariant violations
    #[error("{span}: unresolved name `{name}`")]
    UnresolvedName { name: String, span: Span },

    #[error("{span}: `{name}` does not name a function")]
    NotAFunction { name: String, span: Span },

    #[error("{span}: expected a struct type, found `{found}`")]
    ExpectedStruct { found: String, span: Span },

    #[error("{span}: no field `{field}` on `{ty}`")]
    UnknownField {
        field: String,
        ty: String,
        span: Span,
    },

    #[error("{span}: struct literal is missing field `{field}`")]
    MissingField { field: String, span: Span },

    #[error("{span}: condition has type `{found}`, expected `bool`")]
    NonBoolCondition { found: String, span: Span },

    #[error("no insertion point: emitting after a terminator")]
    NoInsertionPoint,

    #[error(transparent)]
    Ir(#[from] IrError),

    // Control-context errors
    #[error("{span}: `{keyword}` outside of a loop")]
    OutsideLoop { keyword: &'static str, span: Span },

    #[error("{span}: `return` outside of a function")]
    ReturnOutsideFunction { span: Span },

    #[error("{span}: cannot dereference `{found}`")]
    DerefNonPointer { found: String, span: Span },

    #[error("{span}: cannot index into `{found}`")]
    IndexNonArray { found: String, span: Span },

    #[error("{span}: {what} is not addressable")]
    NotAddressable { what: &'static str, span: Span },

    #[error("{span}: cannot mutate through an immutable place")]
    ImmutablePlace { span: Span },
}

impl LowerError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Unsupported { .. } | Self::QualifiedPath { .. } | Self::UnsupportedCast { .. } => {
                ErrorCategory::Unsupported
            }
            Self::UnresolvedName { .. }
            | Self::NotAFunction { .. }
            | Self::ExpectedStruct { .. }
            | Self::UnknownField { .. }
            | Self::MissingField { .. }
            | Self::NonBoolCondition { .. }
            | Self::NoInsertionPoint
            | Self::Ir(_) => ErrorCategory::Invariant,
            Self::OutsideLoop { .. }
            | Self::ReturnOutsideFunction { .. }
            | Self::DerefNonPointer { .. }
            | Self::IndexNonArray { .. }
            | Self::NotAddressable { .. }
            | Self::ImmutablePlace { .. } => ErrorCategory::ControlContext,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_follow_taxonomy() {
        let span = Span::new(1, 4);
        assert_eq!(
            LowerError::Unsupported {
                what: "match expression",
                span
            }
            .category(),
            ErrorCategory::Unsupported
        );
        assert_eq!(
            LowerError::Ir(IrError::BlockTerminated {
                label: "entry".to_owned()
            })
            .category(),
            ErrorCategory::Invariant
        );
        assert_eq!(
            LowerError::OutsideLoop {
                keyword: "break",
                span
            }
            .category(),
            ErrorCategory::ControlContext
        );
    }

    #[test]
    fn messages_carry_location() {
        let err = LowerError::OutsideLoop {
            keyword: "continue",
            span: Span::new(10, 18),
        };
        assert_eq!(err.to_string(), "10..18: `continue` outside of a loop");
    }
}
