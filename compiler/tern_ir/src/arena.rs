//! Arena for resolved expressions.
//!
//! Struct-of-arrays layout: parallel `kinds`, `spans`, `types` arrays
//! indexed by [`ExprId`], plus flat side tables for child lists.

use crate::expr::{
    ExprId, ExprKind, ExprNode, ExprRange, FieldInit, FieldInitRange, NameRange, Stmt, StmtRange,
};
use crate::{Name, Span, TyId};

#[inline]
fn to_u32(len: usize, what: &str) -> u32 {
    u32::try_from(len).unwrap_or_else(|_| panic!("too many {what} (exceeds u32::MAX)"))
}

#[inline]
fn to_u16(len: usize, what: &str) -> u16 {
    u16::try_from(len).unwrap_or_else(|_| panic!("{what} too long (exceeds u16::MAX)"))
}

/// Arena for resolved expressions and statements.
#[derive(Clone, Debug, Default)]
pub struct ExprArena {
    kinds: Vec<ExprKind>,
    spans: Vec<Span>,
    types: Vec<TyId>,
    expr_lists: Vec<ExprId>,
    stmts: Vec<Stmt>,
    field_inits: Vec<FieldInit>,
    names: Vec<Name>,
}

impl ExprArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a node, returning its ID.
    pub fn push(&mut self, node: ExprNode) -> ExprId {
        let id = ExprId::new(to_u32(self.kinds.len(), "expressions"));
        self.kinds.push(node.kind);
        self.spans.push(node.span);
        self.types.push(node.ty);
        id
    }

    /// Shorthand for `push(ExprNode::new(..))`.
    pub fn alloc(&mut self, kind: ExprKind, span: Span, ty: TyId) -> ExprId {
        self.push(ExprNode::new(kind, span, ty))
    }

    #[inline]
    pub fn kind(&self, id: ExprId) -> &ExprKind {
        &self.kinds[id.index()]
    }

    #[inline]
    pub fn span(&self, id: ExprId) -> Span {
        self.spans[id.index()]
    }

    #[inline]
    pub fn ty(&self, id: ExprId) -> TyId {
        self.types[id.index()]
    }

    /// Reconstruct a full node from the parallel arrays.
    pub fn get(&self, id: ExprId) -> ExprNode {
        ExprNode {
            kind: self.kinds[id.index()],
            span: self.spans[id.index()],
            ty: self.types[id.index()],
        }
    }

    /// Bounds-checked node lookup.
    pub fn try_get(&self, id: ExprId) -> Option<ExprNode> {
        (id.index() < self.kinds.len()).then(|| self.get(id))
    }

    /// Overwrite a node's resolved type (used by the resolver's annotation pass).
    pub fn set_ty(&mut self, id: ExprId, ty: TyId) {
        self.types[id.index()] = ty;
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    // -- Side tables --

    pub fn push_expr_list(&mut self, ids: &[ExprId]) -> ExprRange {
        if ids.is_empty() {
            return ExprRange::EMPTY;
        }
        let start = to_u32(self.expr_lists.len(), "expression lists");
        self.expr_lists.extend_from_slice(ids);
        ExprRange::new(start, to_u16(ids.len(), "expression list"))
    }

    pub fn get_expr_list(&self, range: ExprRange) -> &[ExprId] {
        let start = range.start as usize;
        &self.expr_lists[start..start + range.len()]
    }

    pub fn push_stmts(&mut self, stmts: &[Stmt]) -> StmtRange {
        if stmts.is_empty() {
            return StmtRange::EMPTY;
        }
        let start = to_u32(self.stmts.len(), "statements");
        self.stmts.extend_from_slice(stmts);
        StmtRange::new(start, to_u16(stmts.len(), "statement list"))
    }

    pub fn get_stmts(&self, range: StmtRange) -> &[Stmt] {
        let start = range.start as usize;
        &self.stmts[start..start + range.len()]
    }

    pub fn push_field_inits(&mut self, fields: &[FieldInit]) -> FieldInitRange {
        if fields.is_empty() {
            return FieldInitRange::EMPTY;
        }
        let start = to_u32(self.field_inits.len(), "field initializers");
        self.field_inits.extend_from_slice(fields);
        FieldInitRange::new(start, to_u16(fields.len(), "field initializer list"))
    }

    pub fn get_field_inits(&self, range: FieldInitRange) -> &[FieldInit] {
        let start = range.start as usize;
        &self.field_inits[start..start + range.len()]
    }

    pub fn push_names(&mut self, names: &[Name]) -> NameRange {
        if names.is_empty() {
            return NameRange::EMPTY;
        }
        let start = to_u32(self.names.len(), "path segments");
        self.names.extend_from_slice(names);
        NameRange::new(start, to_u16(names.len(), "path"))
    }

    pub fn get_names(&self, range: NameRange) -> &[Name] {
        let start = range.start as usize;
        &self.names[start..start + range.len()]
    }
}
