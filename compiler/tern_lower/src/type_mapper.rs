//! Resolved types → IR types.
//!
//! Structs map to named IR structs whose field list is read straight off
//! the resolver's ordered `StructDef`; field order is never recomputed.
//! Each struct is declared in the module the first time it is mapped.
//! A struct reached again while its own fields are being mapped (through
//! a pointer) maps to its name only.

use rustc_hash::{FxHashMap, FxHashSet};
use tern_ir::{StringInterner, TyId, TyKind, TypePool};
use tern_vir::{IrType, Module};

use crate::LowerError;

/// Caching type mapper for one module.
#[derive(Debug, Default)]
pub struct TypeMapper {
    cache: FxHashMap<TyId, IrType>,
    in_progress: FxHashSet<TyId>,
}

impl TypeMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `ty`, declaring any struct it mentions in `module`.
    pub fn map(
        &mut self,
        pool: &TypePool,
        interner: &StringInterner,
        module: &mut Module,
        ty: TyId,
    ) -> Result<IrType, LowerError> {
        if let Some(mapped) = self.cache.get(&ty) {
            return Ok(mapped.clone());
        }

        let mapped = match pool.kind(ty) {
            TyKind::Bool => IrType::BOOL,
            TyKind::Char => IrType::CHAR,
            TyKind::I32 => IrType::I32,
            TyKind::U32 => IrType::U32,
            TyKind::Isize => IrType::ISIZE,
            TyKind::Usize => IrType::USIZE,
            TyKind::U8 => IrType::U8,
            TyKind::Unit => IrType::UNIT,
            TyKind::Never => IrType::NEVER,
            // `str` and `[T]` only exist behind a reference, which is the
            // (pointer, length) pair itself.
            TyKind::Str => IrType::slice(IrType::U8),
            TyKind::Slice { elem } => IrType::slice(self.map(pool, interner, module, *elem)?),
            TyKind::Ref { mutable, pointee } => match pool.kind(*pointee) {
                TyKind::Str | TyKind::Slice { .. } => self.map(pool, interner, module, *pointee)?,
                _ => IrType::ptr(self.map(pool, interner, module, *pointee)?, *mutable),
            },
            TyKind::Array { elem, len } => {
                IrType::array(self.map(pool, interner, module, *elem)?, *len)
            }
            TyKind::Fn { params, ret } => {
                let params = params
                    .iter()
                    .map(|p| self.map(pool, interner, module, *p))
                    .collect::<Result<Vec<_>, _>>()?;
                IrType::func(params, self.map(pool, interner, module, *ret)?)
            }
            TyKind::Struct(def) => {
                let name = interner.lookup(def.name).to_owned();
                if !self.in_progress.insert(ty) {
                    return Ok(IrType::Struct(name));
                }
                module.declare_opaque_type(&name);
                let fields = def
                    .fields
                    .iter()
                    .map(|(_, field_ty)| self.map(pool, interner, module, *field_ty))
                    .collect::<Result<Vec<_>, _>>();
                self.in_progress.remove(&ty);
                module.declare_type(&name, fields?)?;
                tracing::trace!(name = %name, "declared struct type");
                IrType::Struct(name)
            }
            TyKind::Infer => IrType::Opaque("_".to_owned()),
        };

        self.cache.insert(ty, mapped.clone());
        Ok(mapped)
    }
}

#[cfg(test)]
mod tests;
