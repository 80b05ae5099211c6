//! Top-level items and the resolved crate bundle.

use crate::{ExprArena, ExprId, Name, ScopeId, ScopeTree, Span, TyId, TypePool};

/// A function parameter.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Param {
    pub name: Name,
    pub ty: TyId,
    /// `mut x: T`; such parameters are spilled to a stack slot.
    pub mutable: bool,
    pub span: Span,
}

/// A function declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FnDecl {
    /// Source name.
    pub name: Name,
    /// Name emitted in the module (`Type.method` for impl functions).
    pub link_name: Name,
    pub params: Vec<Param>,
    pub ret: TyId,
    /// `None` for external declarations.
    pub body: Option<ExprId>,
    /// Scope holding the parameters; the body block's scope is a child of it.
    pub scope: ScopeId,
    pub span: Span,
}

impl FnDecl {
    pub fn is_extern(&self) -> bool {
        self.body.is_none()
    }
}

/// `impl Type { fn ... }`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImplBlock {
    pub self_ty: TyId,
    pub fns: Vec<FnDecl>,
    pub span: Span,
}

/// A value folded by the constant evaluator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConstValue {
    Int(i64),
    Bool(bool),
    Char(char),
    Array(Vec<ConstValue>),
    /// Field values in declared field order.
    Struct(Vec<ConstValue>),
}

/// `const NAME: T = value;`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConstDecl {
    pub name: Name,
    pub ty: TyId,
    pub value: ConstValue,
    pub span: Span,
}

/// `struct Name { ... }`; the layout lives in the type pool.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct StructDecl {
    pub name: Name,
    pub ty: TyId,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Item {
    Fn(FnDecl),
    Impl(ImplBlock),
    Const(ConstDecl),
    Struct(StructDecl),
}

/// Everything the resolver hands to lowering for one crate.
#[derive(Clone, Debug, Default)]
pub struct ResolvedCrate {
    pub types: TypePool,
    pub arena: ExprArena,
    pub scopes: ScopeTree,
    /// Items in source order.
    pub items: Vec<Item>,
}

impl ResolvedCrate {
    pub fn new() -> Self {
        Self::default()
    }

    /// All functions, free and associated, in source order.
    pub fn functions(&self) -> impl Iterator<Item = &FnDecl> {
        self.items.iter().flat_map(|item| {
            let fns: &[FnDecl] = match item {
                Item::Fn(decl) => std::slice::from_ref(decl),
                Item::Impl(block) => &block.fns,
                Item::Const(_) | Item::Struct(_) => &[],
            };
            fns
        })
    }
}
