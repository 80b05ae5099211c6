//! Errors raised by the IR data model itself.

use thiserror::Error;

use crate::{BlockId, IrType};

/// A violated local invariant of the module, a function, or a block.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum IrError {
    #[error("block `{label}` is already terminated")]
    BlockTerminated { label: String },

    #[error("block {0:?} does not exist in function `{1}`")]
    UnknownBlock(BlockId, String),

    #[error("function `{0}` is not declared in this module")]
    UnknownFunction(String),

    #[error("function `{0}` has more blocks than a block id can index")]
    TooManyBlocks(String),

    #[error("module has more functions than a function id can index")]
    TooManyFunctions,

    #[error("conflicting declarations of type `%{name}`: {existing} vs {new}")]
    TypeConflict {
        name: String,
        existing: String,
        new: String,
    },

    #[error("conflicting declarations of global `@{name}`")]
    GlobalConflict { name: String },

    #[error("conflicting signatures for function `@{name}`: {existing} vs {new}")]
    FunctionConflict {
        name: String,
        existing: IrType,
        new: IrType,
    },
}
