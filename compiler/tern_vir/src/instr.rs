//! Instructions and terminators.

use std::fmt;

use smallvec::SmallVec;

use crate::{BlockId, IrType, Value, ValueName};

// ── Opcodes ─────────────────────────────────────────────────────────

/// Two-operand arithmetic and bitwise opcodes.
///
/// Division, remainder and right shift come in signed and unsigned
/// forms; the lowering picks one from the operand's IR type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    SDiv,
    UDiv,
    SRem,
    URem,
    And,
    Or,
    Xor,
    Shl,
    AShr,
    LShr,
}

impl BinOp {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Mul => "mul",
            Self::SDiv => "sdiv",
            Self::UDiv => "udiv",
            Self::SRem => "srem",
            Self::URem => "urem",
            Self::And => "and",
            Self::Or => "or",
            Self::Xor => "xor",
            Self::Shl => "shl",
            Self::AShr => "ashr",
            Self::LShr => "lshr",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnOp {
    Neg,
    Not,
}

impl UnOp {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Neg => "neg",
            Self::Not => "not",
        }
    }
}

/// Comparison predicates. The result is always `bool`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CmpPred {
    Eq,
    Ne,
    Slt,
    Sle,
    Sgt,
    Sge,
    Ult,
    Ule,
    Ugt,
    Uge,
}

impl CmpPred {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Slt => "slt",
            Self::Sle => "sle",
            Self::Sgt => "sgt",
            Self::Sge => "sge",
            Self::Ult => "ult",
            Self::Ule => "ule",
            Self::Ugt => "ugt",
            Self::Uge => "uge",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CastKind {
    /// Same bits, different type (pointer mutability changes).
    Bitcast,
    Trunc,
    Zext,
    Sext,
}

impl CastKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bitcast => "bitcast",
            Self::Trunc => "trunc",
            Self::Zext => "zext",
            Self::Sext => "sext",
        }
    }
}

// ── Instructions ────────────────────────────────────────────────────

/// The operation an [`Instruction`] performs.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum InstKind {
    /// Materialize a constant into a register.
    Const(Value),
    /// Reserve a stack slot. Result type is `ptr mut allocated`.
    Alloca { allocated: IrType },
    Load { ptr: Value },
    Store { ptr: Value, value: Value },
    Binary { op: BinOp, lhs: Value, rhs: Value },
    Unary { op: UnOp, operand: Value },
    Cmp { pred: CmpPred, lhs: Value, rhs: Value },
    /// Direct call; `callee` is a [`Value::Global`] naming a function.
    Call { callee: Value, args: Vec<Value> },
    /// Address arithmetic: `base` points at a `base_ty`, each index steps
    /// one level into it (struct field or array element). No memory access.
    Gep {
        base_ty: IrType,
        base: Value,
        indices: SmallVec<[Value; 2]>,
    },
    Phi { incoming: Vec<(Value, BlockId)> },
    Cast { kind: CastKind, value: Value },
}

impl InstKind {
    /// Every value this instruction reads.
    pub fn operands(&self) -> SmallVec<[&Value; 4]> {
        let mut out = SmallVec::new();
        match self {
            Self::Const(v) | Self::Load { ptr: v } | Self::Unary { operand: v, .. } => {
                out.push(v);
            }
            Self::Cast { value, .. } => out.push(value),
            Self::Alloca { .. } => {}
            Self::Store { ptr, value } => {
                out.push(ptr);
                out.push(value);
            }
            Self::Binary { lhs, rhs, .. } | Self::Cmp { lhs, rhs, .. } => {
                out.push(lhs);
                out.push(rhs);
            }
            Self::Call { callee, args } => {
                out.push(callee);
                out.extend(args.iter());
            }
            Self::Gep { base, indices, .. } => {
                out.push(base);
                out.extend(indices.iter());
            }
            Self::Phi { incoming } => out.extend(incoming.iter().map(|(v, _)| v)),
        }
        out
    }

    /// Stores and calls write memory or may; everything else is pure.
    pub fn has_side_effects(&self) -> bool {
        matches!(self, Self::Store { .. } | Self::Call { .. })
    }

    pub fn is_alloca(&self) -> bool {
        matches!(self, Self::Alloca { .. })
    }

    pub const fn opcode(&self) -> &'static str {
        match self {
            Self::Const(_) => "const",
            Self::Alloca { .. } => "alloca",
            Self::Load { .. } => "load",
            Self::Store { .. } => "store",
            Self::Binary { op, .. } => op.as_str(),
            Self::Unary { op, .. } => op.as_str(),
            Self::Cmp { .. } => "cmp",
            Self::Call { .. } => "call",
            Self::Gep { .. } => "gep",
            Self::Phi { .. } => "phi",
            Self::Cast { kind, .. } => kind.as_str(),
        }
    }
}

/// One non-terminator instruction: a result name, a result type and an
/// operation.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Instruction {
    pub name: ValueName,
    pub ty: IrType,
    pub kind: InstKind,
}

impl Instruction {
    pub fn new(name: ValueName, ty: IrType, kind: InstKind) -> Self {
        Self { name, ty, kind }
    }

    /// A reference to this instruction's result.
    pub fn result(&self) -> Value {
        Value::Reg {
            name: self.name.clone(),
            ty: self.ty.clone(),
        }
    }

    /// Whether `value` reads this instruction's result.
    pub fn defines(&self, value: &Value) -> bool {
        value.reg_name() == Some(&self.name)
    }

    /// Whether any operand is the register `name`.
    pub fn uses(&self, name: &ValueName) -> bool {
        self.kind
            .operands()
            .iter()
            .any(|v| v.reg_name() == Some(name))
    }

    /// The type printed after the opcode.
    ///
    /// Usually the result type; stores print the stored value's type,
    /// comparisons and casts their operand's, allocas and geps the type
    /// being addressed.
    pub fn display_ty(&self) -> &IrType {
        match &self.kind {
            InstKind::Alloca { allocated } => allocated,
            InstKind::Store { value, .. } => value.ty(),
            InstKind::Cmp { lhs, .. } => lhs.ty(),
            InstKind::Cast { value, .. } => value.ty(),
            InstKind::Gep { base_ty, .. } => base_ty,
            InstKind::Const(_)
            | InstKind::Load { .. }
            | InstKind::Binary { .. }
            | InstKind::Unary { .. }
            | InstKind::Call { .. }
            | InstKind::Phi { .. } => &self.ty,
        }
    }
}

// ── Terminators ─────────────────────────────────────────────────────

/// How control leaves a block.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Terminator {
    /// `None` returns from a `void` function.
    Return(Option<Value>),
    Branch {
        cond: Value,
        then_block: BlockId,
        else_block: BlockId,
    },
    Jump(BlockId),
}

impl Terminator {
    pub fn successors(&self) -> SmallVec<[BlockId; 2]> {
        match self {
            Self::Return(_) => SmallVec::new(),
            Self::Branch {
                then_block,
                else_block,
                ..
            } => SmallVec::from_buf([*then_block, *else_block]),
            Self::Jump(target) => {
                let mut out = SmallVec::new();
                out.push(*target);
                out
            }
        }
    }

    pub const fn opcode(&self) -> &'static str {
        match self {
            Self::Return(_) => "ret",
            Self::Branch { .. } => "br",
            Self::Jump(_) => "jmp",
        }
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for CmpPred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
