//! Struct and array literals, field access and indexing.
//!
//! Literals are built in a stack slot (one indexed-address store per
//! element) and read back as a whole, giving them value semantics. Field
//! and index expressions compute addresses from their base's place.

use smallvec::smallvec;
use tern_ir::{ExprId, ExprRange, FieldInitRange, Name, Span, TyId, TyKind};
use tern_vir::{IrType, Value};

use super::{deref_place, ExprLowerer, Place};
use crate::LowerError;

/// `i32` index operand for a struct field.
fn field_index(index: usize) -> Value {
    Value::int(index as i128, IrType::I32)
}

impl ExprLowerer<'_, '_> {
    /// Strip references off a resolved type, counting them.
    fn peel_refs(&self, mut ty: TyId) -> (TyId, usize) {
        let mut depth = 0;
        while let TyKind::Ref { pointee, .. } = self.pool.kind(ty) {
            ty = *pointee;
            depth += 1;
        }
        (ty, depth)
    }

    /// The place of `base`, auto-dereferenced `derefs` times.
    fn base_place(&mut self, base: ExprId, derefs: usize, span: Span) -> Result<Place, LowerError> {
        if derefs == 0 {
            return self.lower_place(base);
        }
        let ptr = self.lower_expr(base)?;
        if !self.live() {
            return Ok(Place::unreachable());
        }
        let mut place = deref_place(ptr, span)?;
        for _ in 1..derefs {
            let ptr = self.load_place(place)?;
            place = deref_place(ptr, span)?;
        }
        Ok(place)
    }

    // ── Struct literals ────────────────────────────────────────

    /// Initialisers run in the struct's declared field order, whatever the
    /// order in the source.
    pub(crate) fn lower_struct_lit(
        &mut self,
        fields: FieldInitRange,
        ty: TyId,
        span: Span,
    ) -> Result<Value, LowerError> {
        let pool = self.pool;
        let arena = self.arena;
        let struct_ty = self.cx.map_type(ty)?;
        let Some(def) = pool.struct_def(ty) else {
            return Err(LowerError::ExpectedStruct {
                found: struct_ty.to_string(),
                span,
            });
        };
        let inits = arena.get_field_inits(fields);
        if let Some(stray) = inits.iter().find(|i| def.field_index(i.name).is_none()) {
            return Err(LowerError::UnknownField {
                field: self.cx.name_str(stray.name).to_owned(),
                ty: struct_ty.to_string(),
                span: stray.span,
            });
        }

        let slot = self.cx.builder.alloca(struct_ty.clone(), None)?;
        for (index, (field, field_ty)) in def.fields.iter().enumerate() {
            let Some(init) = inits.iter().find(|i| i.name == *field) else {
                return Err(LowerError::MissingField {
                    field: self.cx.name_str(*field).to_owned(),
                    span,
                });
            };
            let value = self.lower_expr(init.value)?;
            if !self.live() {
                return Ok(Value::unreachable());
            }
            let field_ty = self.cx.map_type(*field_ty)?;
            let addr = self.cx.builder.gep(
                struct_ty.clone(),
                slot.clone(),
                smallvec![field_index(0), field_index(index)],
                field_ty,
            )?;
            self.cx.builder.store(addr, value)?;
        }
        self.cx.builder.load(slot, struct_ty)
    }

    // ── Array literals ─────────────────────────────────────────

    pub(crate) fn lower_array(
        &mut self,
        elems: ExprRange,
        ty: TyId,
        span: Span,
    ) -> Result<Value, LowerError> {
        let array_ty = self.cx.map_type(ty)?;
        let IrType::Array { elem, .. } = &array_ty else {
            return Err(LowerError::IndexNonArray {
                found: array_ty.to_string(),
                span,
            });
        };
        let elem_ty = (**elem).clone();

        let arena = self.arena;
        let slot = self.cx.builder.alloca(array_ty.clone(), None)?;
        for (index, elem) in arena.get_expr_list(elems).iter().enumerate() {
            let value = self.lower_expr(*elem)?;
            if !self.live() {
                return Ok(Value::unreachable());
            }
            let addr = self.cx.builder.gep(
                array_ty.clone(),
                slot.clone(),
                smallvec![
                    Value::int(0, IrType::USIZE),
                    Value::int(index as i128, IrType::USIZE)
                ],
                elem_ty.clone(),
            )?;
            self.cx.builder.store(addr, value)?;
        }
        self.cx.builder.load(slot, array_ty)
    }

    // ── Field access and indexing ──────────────────────────────

    /// `base.field`, auto-dereferencing a reference base.
    pub(crate) fn lower_field_place(
        &mut self,
        base: ExprId,
        field: Name,
        span: Span,
    ) -> Result<Place, LowerError> {
        let pool = self.pool;
        let (struct_ty, derefs) = self.peel_refs(self.arena.ty(base));
        let place = self.base_place(base, derefs, span)?;
        if !self.live() {
            return Ok(Place::unreachable());
        }
        let Some(def) = pool.struct_def(struct_ty) else {
            return Err(LowerError::ExpectedStruct {
                found: place.ty.to_string(),
                span,
            });
        };
        let Some((index, field_ty)) = def.field(field) else {
            return Err(LowerError::UnknownField {
                field: self.cx.name_str(field).to_owned(),
                ty: place.ty.to_string(),
                span,
            });
        };

        let field_ty = self.cx.map_type(field_ty)?;
        let addr = self.cx.builder.gep(
            place.ty,
            place.addr,
            smallvec![field_index(0), field_index(index)],
            field_ty.clone(),
        )?;
        Ok(Place {
            addr,
            ty: field_ty,
            mutable: place.mutable,
        })
    }

    /// `base[index]` on a fixed-size array, auto-dereferencing a reference
    /// base.
    pub(crate) fn lower_index_place(
        &mut self,
        base: ExprId,
        index: ExprId,
        span: Span,
    ) -> Result<Place, LowerError> {
        let (_, derefs) = self.peel_refs(self.arena.ty(base));
        let place = self.base_place(base, derefs, span)?;
        if !self.live() {
            return Ok(Place::unreachable());
        }
        let IrType::Array { elem, .. } = &place.ty else {
            return Err(LowerError::IndexNonArray {
                found: place.ty.to_string(),
                span,
            });
        };
        let elem_ty = (**elem).clone();

        let index = self.lower_expr(index)?;
        if !self.live() {
            return Ok(Place::unreachable());
        }
        let zero = Value::int(0, index.ty().clone());
        let addr = self.cx.builder.gep(
            place.ty,
            place.addr,
            smallvec![zero, index],
            elem_ty.clone(),
        )?;
        Ok(Place {
            addr,
            ty: elem_ty,
            mutable: place.mutable,
        })
    }
}

#[cfg(test)]
mod tests;
