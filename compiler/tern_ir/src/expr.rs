//! Resolved expression and statement nodes.
//!
//! Expressions live in an [`ExprArena`](crate::ExprArena) and reference
//! each other by [`ExprId`]. Optional children use [`ExprId::INVALID`]
//! (no else branch, no tail expression, bare `return`). Child lists are
//! ranges into the arena's side tables.

use std::fmt;

use crate::{BinaryOp, Name, ScopeId, Span, TyId, UnaryOp};

/// Index into an [`ExprArena`](crate::ExprArena).
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
#[repr(transparent)]
pub struct ExprId(u32);

impl ExprId {
    /// Sentinel value indicating "no expression".
    pub const INVALID: ExprId = ExprId(u32::MAX);

    #[inline]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Returns `true` if this is a valid (non-sentinel) ID.
    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 != u32::MAX
    }

    /// `None` for the sentinel, `Some(self)` otherwise.
    #[inline]
    pub const fn valid(self) -> Option<ExprId> {
        if self.is_valid() {
            Some(self)
        } else {
            None
        }
    }
}

impl fmt::Debug for ExprId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::INVALID {
            write!(f, "ExprId::INVALID")
        } else {
            write!(f, "ExprId({})", self.0)
        }
    }
}

macro_rules! define_range {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
        #[repr(C)]
        pub struct $name {
            pub start: u32,
            pub len: u16,
        }

        impl $name {
            /// Empty range constant.
            pub const EMPTY: Self = Self { start: 0, len: 0 };

            #[inline]
            pub const fn new(start: u32, len: u16) -> Self {
                Self { start, len }
            }

            #[inline]
            pub const fn is_empty(&self) -> bool {
                self.len == 0
            }

            #[inline]
            pub const fn len(&self) -> usize {
                self.len as usize
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(
                    f,
                    concat!(stringify!($name), "({}..{})"),
                    self.start,
                    self.start + u32::from(self.len)
                )
            }
        }
    };
}

define_range!(
    /// Range of expression ids (call arguments, array elements).
    ExprRange
);
define_range!(
    /// Range of statements in a block.
    StmtRange
);
define_range!(
    /// Range of struct literal field initializers.
    FieldInitRange
);
define_range!(
    /// Range of path segments.
    NameRange
);

/// One `name: value` entry of a struct literal, in source order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct FieldInit {
    pub name: Name,
    pub value: ExprId,
    pub span: Span,
}

/// A resolved expression.
///
/// Every variant is `Copy`; child lists are ranges into the arena.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ExprKind {
    // Literals
    Int(u64),
    Bool(bool),
    Char(char),
    Str(Name),
    Unit,

    /// `a` or `a::b::c`. Only single-segment paths are lowered.
    Path(NameRange),

    // Operators
    Binary {
        op: BinaryOp,
        lhs: ExprId,
        rhs: ExprId,
    },
    Unary {
        op: UnaryOp,
        operand: ExprId,
    },
    Assign {
        target: ExprId,
        value: ExprId,
    },
    /// `target op= value`.
    CompoundAssign {
        op: BinaryOp,
        target: ExprId,
        value: ExprId,
    },
    Borrow {
        mutable: bool,
        operand: ExprId,
    },
    Deref(ExprId),
    /// `operand as T`, with `T` the node's own type.
    Cast(ExprId),

    // Control flow
    Block {
        scope: ScopeId,
        stmts: StmtRange,
        /// Tail expression, `INVALID` if the block ends in a statement.
        tail: ExprId,
    },
    If {
        cond: ExprId,
        then_branch: ExprId,
        /// `INVALID` when there is no else arm.
        else_branch: ExprId,
    },
    While {
        cond: ExprId,
        body: ExprId,
    },
    Loop {
        body: ExprId,
    },
    Break,
    Continue,
    /// `return` / `return value` (`INVALID` when bare).
    Return(ExprId),

    // Calls
    Call {
        callee: ExprId,
        args: ExprRange,
    },
    MethodCall {
        receiver: ExprId,
        method: Name,
        args: ExprRange,
    },

    // Aggregates
    /// Struct literal; the struct type is the node's own type.
    StructLit {
        fields: FieldInitRange,
    },
    Field {
        base: ExprId,
        field: Name,
    },
    Index {
        base: ExprId,
        index: ExprId,
    },
    Array(ExprRange),
    Tuple(ExprRange),

    Match {
        scrutinee: ExprId,
    },
}

impl ExprKind {
    /// Human-readable variant name for diagnostics.
    pub const fn describe(&self) -> &'static str {
        match self {
            Self::Int(_) => "integer literal",
            Self::Bool(_) => "boolean literal",
            Self::Char(_) => "char literal",
            Self::Str(_) => "string literal",
            Self::Unit => "unit literal",
            Self::Path(_) => "path",
            Self::Binary { .. } => "binary expression",
            Self::Unary { .. } => "unary expression",
            Self::Assign { .. } => "assignment",
            Self::CompoundAssign { .. } => "compound assignment",
            Self::Borrow { .. } => "borrow",
            Self::Deref(_) => "dereference",
            Self::Cast(_) => "cast",
            Self::Block { .. } => "block",
            Self::If { .. } => "if expression",
            Self::While { .. } => "while loop",
            Self::Loop { .. } => "loop",
            Self::Break => "break",
            Self::Continue => "continue",
            Self::Return(_) => "return",
            Self::Call { .. } => "call",
            Self::MethodCall { .. } => "method call",
            Self::StructLit { .. } => "struct literal",
            Self::Field { .. } => "field access",
            Self::Index { .. } => "index expression",
            Self::Array(_) => "array literal",
            Self::Tuple(_) => "tuple",
            Self::Match { .. } => "match expression",
        }
    }
}

/// Full node: kind + span + resolved type.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ExprNode {
    pub kind: ExprKind,
    pub span: Span,
    pub ty: TyId,
}

impl ExprNode {
    pub const fn new(kind: ExprKind, span: Span, ty: TyId) -> Self {
        Self { kind, span, ty }
    }
}

/// Binding pattern on the left of a `let`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Pattern {
    Ident { name: Name, mutable: bool },
    Wildcard,
    /// Destructuring; not lowered.
    Tuple,
}

/// A statement inside a block.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Stmt {
    /// `let pattern: ty = init;` (`init` is `INVALID` when absent).
    Let {
        pattern: Pattern,
        ty: TyId,
        init: ExprId,
        span: Span,
    },
    /// Expression statement without a trailing semicolon.
    Expr(ExprId),
    /// Expression statement with a trailing semicolon.
    Semi(ExprId),
    /// Nested item; not lowered.
    Item(Span),
}
