//! Literals and paths in value position.

use tern_ir::{Name, NameRange, Namespace, Span, Symbol, TyId};
use tern_vir::{Constant, IrType, Value};

use super::{ExprLowerer, Place};
use crate::env::Binding;
use crate::LowerError;

impl ExprLowerer<'_, '_> {
    /// Integer literal typed with its resolved type (`i32` when the
    /// resolver left it open).
    pub(crate) fn lower_int(&mut self, value: u64, ty: TyId) -> Result<Value, LowerError> {
        let ty = match self.cx.map_type(ty)? {
            IrType::Prim(prim) if prim.is_integer() => IrType::Prim(prim),
            _ => IrType::I32,
        };
        Ok(Value::int(i128::from(value), ty))
    }

    pub(crate) fn lower_char(value: char) -> Value {
        Value::Const {
            value: Constant::Char(value),
            ty: IrType::CHAR,
        }
    }

    /// An identifier in value position. Stack slots are loaded; SSA values
    /// and parameters are used as they are.
    pub(crate) fn lower_path(&mut self, segments: NameRange, span: Span) -> Result<Value, LowerError> {
        let name = self.single_segment(segments, span)?;
        match self.cx.env.resolve(name).cloned() {
            Some(Binding::Value(value) | Binding::Param(value)) => Ok(value),
            Some(Binding::Slot { addr, ty, .. }) => self.cx.builder.load(addr, ty),
            None => match self.cx.resolve_symbol(name, Namespace::Value) {
                Some(Symbol::Function { link_name, ty }) => {
                    let id = self.cx.function_for_symbol(link_name, ty, span)?;
                    Ok(self.cx.builder.module().function_ref(id)?)
                }
                _ => {
                    let place = self.lower_global_place(name, span)?;
                    self.load_place(place)
                }
            },
        }
    }

    /// A `const` item's global, as an immutable place.
    pub(crate) fn lower_global_place(&mut self, name: Name, span: Span) -> Result<Place, LowerError> {
        let text = self.cx.name_str(name);
        let unresolved = || LowerError::UnresolvedName {
            name: text.to_owned(),
            span,
        };
        let Some(Symbol::Const { link_name, ty }) = self.cx.resolve_symbol(name, Namespace::Value)
        else {
            return Err(unresolved());
        };
        let ty = self.cx.map_type(ty)?;
        let global = self
            .cx
            .builder
            .module()
            .global(self.cx.name_str(link_name))
            .map(tern_vir::Global::address);
        match global {
            Some(addr) => Ok(Place {
                addr,
                ty,
                mutable: false,
            }),
            None => Err(unresolved()),
        }
    }
}
