//! Operator lowering: arithmetic, comparisons, short-circuit logic,
//! assignment, borrows and casts.
//!
//! Signed versus unsigned opcodes are chosen from the IR type of the left
//! operand (or of the place being updated), never from source syntax, so
//! the choice always agrees with the IR's own types.

use tern_ir::{BinaryOp, ExprId, Span, TyId, UnaryOp};
use tern_vir::{BinOp, CastKind, CmpPred, IrType, UnOp, Value};

use super::ExprLowerer;
use crate::LowerError;

impl ExprLowerer<'_, '_> {
    // ── Binary ─────────────────────────────────────────────────

    pub(crate) fn lower_binary(
        &mut self,
        op: BinaryOp,
        lhs: ExprId,
        rhs: ExprId,
        span: Span,
    ) -> Result<Value, LowerError> {
        if op.is_short_circuit() {
            return self.lower_short_circuit(op, lhs, rhs, span);
        }
        let lhs = self.lower_expr(lhs)?;
        if !self.live() {
            return Ok(Value::unreachable());
        }
        let rhs = self.lower_expr(rhs)?;
        if !self.live() {
            return Ok(Value::unreachable());
        }
        self.emit_binary(op, lhs, rhs, span)
    }

    /// Emit the instruction for an eager binary operator.
    pub(crate) fn emit_binary(
        &mut self,
        op: BinaryOp,
        lhs: Value,
        rhs: Value,
        span: Span,
    ) -> Result<Value, LowerError> {
        let signed = lhs.ty().is_signed();
        if op.is_comparison() {
            let pred = match (op, signed) {
                (BinaryOp::Eq, _) => CmpPred::Eq,
                (BinaryOp::NotEq, _) => CmpPred::Ne,
                (BinaryOp::Lt, true) => CmpPred::Slt,
                (BinaryOp::Lt, false) => CmpPred::Ult,
                (BinaryOp::LtEq, true) => CmpPred::Sle,
                (BinaryOp::LtEq, false) => CmpPred::Ule,
                (BinaryOp::Gt, true) => CmpPred::Sgt,
                (BinaryOp::Gt, false) => CmpPred::Ugt,
                (BinaryOp::GtEq, true) => CmpPred::Sge,
                _ => CmpPred::Uge,
            };
            return self.cx.builder.cmp(pred, lhs, rhs);
        }

        let op = match op {
            BinaryOp::Add => BinOp::Add,
            BinaryOp::Sub => BinOp::Sub,
            BinaryOp::Mul => BinOp::Mul,
            BinaryOp::Div if signed => BinOp::SDiv,
            BinaryOp::Div => BinOp::UDiv,
            BinaryOp::Rem if signed => BinOp::SRem,
            BinaryOp::Rem => BinOp::URem,
            BinaryOp::BitAnd => BinOp::And,
            BinaryOp::BitOr => BinOp::Or,
            BinaryOp::BitXor => BinOp::Xor,
            BinaryOp::Shl => BinOp::Shl,
            BinaryOp::Shr if signed => BinOp::AShr,
            BinaryOp::Shr => BinOp::LShr,
            BinaryOp::And
            | BinaryOp::Or
            | BinaryOp::Eq
            | BinaryOp::NotEq
            | BinaryOp::Lt
            | BinaryOp::LtEq
            | BinaryOp::Gt
            | BinaryOp::GtEq => {
                return Err(LowerError::Unsupported {
                    what: "logical operator outside of a condition",
                    span,
                })
            }
        };
        self.cx.builder.binary(op, lhs, rhs)
    }

    /// `a && b` / `a || b` through a scratch `bool` slot.
    ///
    /// ```text
    /// entry:    store a -> slot; br a, %rhs, %merge   (&&: rhs on true)
    ///                            br a, %merge, %rhs   (||: rhs on false)
    /// rhs:      store b -> slot; jmp %merge
    /// merge:    load slot
    /// ```
    fn lower_short_circuit(
        &mut self,
        op: BinaryOp,
        lhs: ExprId,
        rhs: ExprId,
        span: Span,
    ) -> Result<Value, LowerError> {
        let left = self.lower_expr(lhs)?;
        if !self.live() {
            return Ok(Value::unreachable());
        }
        expect_bool(&left, span)?;

        let func = self.current_function()?;
        let slot = self.cx.builder.alloca(IrType::BOOL, None)?;
        self.cx.builder.store(slot.clone(), left.clone())?;

        let is_and = op == BinaryOp::And;
        let (rhs_hint, merge_hint) = if is_and {
            ("and.rhs", "and.merge")
        } else {
            ("or.rhs", "or.merge")
        };
        let rhs_block = self.cx.builder.new_block(rhs_hint)?;
        let merge = self.cx.builder.new_block(merge_hint)?;
        if is_and {
            self.cx.builder.branch(left, rhs_block, merge)?;
        } else {
            self.cx.builder.branch(left, merge, rhs_block)?;
        }

        self.cx.builder.position_at(func, rhs_block)?;
        let right = self.lower_expr(rhs)?;
        if self.live() {
            self.cx.builder.store(slot.clone(), right)?;
            self.cx.builder.jump(merge)?;
        }

        self.cx.builder.position_at(func, merge)?;
        self.cx.builder.load(slot, IrType::BOOL)
    }

    // ── Unary ──────────────────────────────────────────────────

    pub(crate) fn lower_unary(
        &mut self,
        op: UnaryOp,
        operand: ExprId,
    ) -> Result<Value, LowerError> {
        let value = self.lower_expr(operand)?;
        if !self.live() {
            return Ok(Value::unreachable());
        }
        let op = match op {
            UnaryOp::Neg => UnOp::Neg,
            UnaryOp::Not => UnOp::Not,
        };
        self.cx.builder.unary(op, value)
    }

    // ── Assignment ─────────────────────────────────────────────

    /// `target = value`. The place is resolved before the value is
    /// evaluated. Yields unit.
    pub(crate) fn lower_assign(
        &mut self,
        target: ExprId,
        value: ExprId,
        span: Span,
    ) -> Result<Value, LowerError> {
        let place = self.lower_place(target)?;
        if !self.live() {
            return Ok(Value::unreachable());
        }
        if !place.mutable {
            return Err(LowerError::ImmutablePlace { span });
        }
        let value = self.lower_expr(value)?;
        if !self.live() {
            return Ok(Value::unreachable());
        }
        self.cx.builder.store(place.addr, value)?;
        Ok(Value::unit())
    }

    /// `target op= value`: load, combine, store back. Yields unit.
    pub(crate) fn lower_compound_assign(
        &mut self,
        op: BinaryOp,
        target: ExprId,
        value: ExprId,
        span: Span,
    ) -> Result<Value, LowerError> {
        let place = self.lower_place(target)?;
        if !self.live() {
            return Ok(Value::unreachable());
        }
        if !place.mutable {
            return Err(LowerError::ImmutablePlace { span });
        }
        let current = self.cx.builder.load(place.addr.clone(), place.ty.clone())?;
        let rhs = self.lower_expr(value)?;
        if !self.live() {
            return Ok(Value::unreachable());
        }
        let combined = self.emit_binary(op, current, rhs, span)?;
        self.cx.builder.store(place.addr, combined)?;
        Ok(Value::unit())
    }

    // ── Borrow and cast ────────────────────────────────────────

    /// `&place` / `&mut place`. The place's own address is reused when its
    /// pointer type already matches; otherwise it is bitcast.
    pub(crate) fn lower_borrow(
        &mut self,
        mutable: bool,
        operand: ExprId,
        span: Span,
    ) -> Result<Value, LowerError> {
        let place = self.lower_place(operand)?;
        if !self.live() {
            return Ok(Value::unreachable());
        }
        if mutable && !place.mutable {
            return Err(LowerError::ImmutablePlace { span });
        }
        let wanted = IrType::ptr(place.ty, mutable);
        if *place.addr.ty() == wanted {
            return Ok(place.addr);
        }
        self.cx.builder.cast(CastKind::Bitcast, place.addr, wanted)
    }

    /// `operand as T` between integer-like primitives and between pointers.
    pub(crate) fn lower_cast(
        &mut self,
        operand: ExprId,
        target: TyId,
        span: Span,
    ) -> Result<Value, LowerError> {
        let value = self.lower_expr(operand)?;
        if !self.live() {
            return Ok(Value::unreachable());
        }
        let to = self.cx.map_type(target)?;
        let from = value.ty().clone();
        if from == to {
            return Ok(value);
        }

        let kind = match (&from, &to) {
            (IrType::Prim(src), IrType::Prim(dst)) if !src.is_void() && !dst.is_void() => {
                match dst.size().cmp(&src.size()) {
                    std::cmp::Ordering::Less => CastKind::Trunc,
                    std::cmp::Ordering::Greater if src.is_signed() => CastKind::Sext,
                    std::cmp::Ordering::Greater => CastKind::Zext,
                    std::cmp::Ordering::Equal => CastKind::Bitcast,
                }
            }
            (IrType::Ptr { .. }, IrType::Ptr { .. }) => CastKind::Bitcast,
            _ => {
                return Err(LowerError::UnsupportedCast {
                    from: from.to_string(),
                    to: to.to_string(),
                    span,
                })
            }
        };
        self.cx.builder.cast(kind, value, to)
    }
}

/// Conditions must already be `bool`.
pub(crate) fn expect_bool(value: &Value, span: Span) -> Result<(), LowerError> {
    if value.ty().is_bool() {
        Ok(())
    } else {
        Err(LowerError::NonBoolCondition {
            found: value.ty().to_string(),
            span,
        })
    }
}
