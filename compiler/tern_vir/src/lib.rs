//! Tern virtual instruction set.
//!
//! A control-flow-graph IR in the usual shape:
//!
//! - **[`Module`]**: declared struct types, constant globals, functions
//! - **[`Function`]**: signature plus ordered [`BasicBlock`]s; the first is `entry`
//! - **[`BasicBlock`]**: label, [`Instruction`]s, at most one [`Terminator`]
//! - **[`Value`]**: registers, parameters, globals, labels, `undef`, constants
//! - **[`IrType`]**: primitives, pointers, arrays, named structs, slices,
//!   function types
//!
//! The data model is passive. It enforces local invariants (a terminated
//! block accepts nothing more, conflicting declarations are rejected) and
//! leaves every construction decision to the lowering stage.
//!
//! [`Module::render`] produces the textual form; [`outline::parse_outline`]
//! reads its structure back.

mod error;
mod function;
mod instr;
mod module;
pub mod outline;
mod render;
mod ty;
mod value;

pub use error::IrError;
pub use function::{BasicBlock, Function, Param};
pub use instr::{BinOp, CastKind, CmpPred, InstKind, Instruction, Terminator, UnOp};
pub use module::{Global, Module, TypeDef};
pub use render::FunctionDisplay;
pub use ty::{IrType, PrimType};
pub use value::{BlockId, Constant, FuncId, Value, ValueName};

#[cfg(test)]
mod tests;
