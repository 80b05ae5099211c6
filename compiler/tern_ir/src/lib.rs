//! Tern IR - the resolved program handed to lowering.
//!
//! This crate is the narrow interface between the front end (preprocessor,
//! lexer, parser, resolver, constant evaluator) and the lowering stage:
//!
//! - Spans for source locations
//! - Names for interned identifiers
//! - The resolved type pool ([`TypePool`], [`TyId`], [`TyKind`])
//! - The resolved expression arena ([`ExprArena`], [`ExprKind`], [`Stmt`])
//! - The scope chain ([`ScopeTree`]) used for name lookups during lowering
//! - Items and the [`ResolvedCrate`] bundle
//!
//! # Design Philosophy
//!
//! - **Intern Everything**: Strings → `Name(u32)`, Types → `TyId(u32)`
//! - **Flatten Everything**: No `Box<Expr>`, children are `ExprId(u32)` indices
//!   and child lists are ranges into side tables, so `ExprKind` is `Copy`.
//! - **Annotated in place**: every node carries the type the resolver assigned
//!   to it; lowering never re-derives semantics.

mod arena;
mod expr;
mod interner;
mod item;
mod name;
mod ops;
mod scope;
mod span;
mod ty;

pub use arena::ExprArena;
pub use expr::{
    ExprId, ExprKind, ExprNode, ExprRange, FieldInit, FieldInitRange, NameRange, Pattern, Stmt,
    StmtRange,
};
pub use interner::StringInterner;
pub use item::{ConstDecl, ConstValue, FnDecl, ImplBlock, Item, Param, ResolvedCrate, StructDecl};
pub use name::Name;
pub use ops::{BinaryOp, UnaryOp};
pub use scope::{Namespace, ScopeId, ScopeTree, Symbol};
pub use span::Span;
pub use ty::{StructDef, TyId, TyKind, TypePool};
