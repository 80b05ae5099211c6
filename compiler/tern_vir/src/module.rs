//! The module: declared types, globals, and functions.
//!
//! Declaration is idempotent. Re-declaring an identical entry returns the
//! existing one; declaring a same-named entry with a different shape is an
//! [`IrError`] conflict.

use rustc_hash::FxHashMap;

use crate::{Constant, FuncId, Function, IrError, IrType, Param, Value};

/// A named struct type. `fields` is `None` while the body is still being
/// mapped (self-referential structs).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeDef {
    pub name: String,
    pub fields: Option<Vec<IrType>>,
}

/// `@name = constant <type> <value>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Global {
    pub name: String,
    pub ty: IrType,
    pub init: Constant,
}

impl Global {
    /// Operand referring to this global's address.
    pub fn address(&self) -> Value {
        Value::Global {
            name: self.name.clone(),
            ty: IrType::ptr(self.ty.clone(), false),
        }
    }
}

/// Nesting depth past which layout gives up (only reachable through a
/// by-value struct cycle).
const MAX_LAYOUT_DEPTH: u32 = 128;

/// One compilation unit's worth of IR.
#[derive(Clone, Debug, Default)]
pub struct Module {
    pub name: String,
    types: Vec<TypeDef>,
    type_index: FxHashMap<String, usize>,
    globals: Vec<Global>,
    global_index: FxHashMap<String, usize>,
    functions: Vec<Function>,
    function_index: FxHashMap<String, FuncId>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    // ── Types ───────────────────────────────────────────────────────

    /// Reserve a struct name before its fields are known.
    pub fn declare_opaque_type(&mut self, name: &str) {
        if !self.type_index.contains_key(name) {
            self.type_index.insert(name.to_owned(), self.types.len());
            self.types.push(TypeDef {
                name: name.to_owned(),
                fields: None,
            });
        }
    }

    /// Declare (or complete) a struct type with its ordered fields.
    pub fn declare_type(&mut self, name: &str, fields: Vec<IrType>) -> Result<(), IrError> {
        self.declare_opaque_type(name);
        let Some(&index) = self.type_index.get(name) else {
            return Ok(());
        };
        let def = &mut self.types[index];
        if def.fields.is_none() {
            def.fields = Some(fields);
            return Ok(());
        }
        if def.fields.as_ref() == Some(&fields) {
            return Ok(());
        }
        Err(IrError::TypeConflict {
            name: name.to_owned(),
            existing: def.fields.as_deref().map(render_fields).unwrap_or_default(),
            new: render_fields(&fields),
        })
    }

    /// Ordered field types of a completed struct.
    pub fn struct_fields(&self, name: &str) -> Option<&[IrType]> {
        self.type_index
            .get(name)
            .and_then(|&i| self.types[i].fields.as_deref())
    }

    // ── Globals ─────────────────────────────────────────────────────

    /// Declare a constant global, returning an operand for its address.
    pub fn declare_global(&mut self, global: Global) -> Result<Value, IrError> {
        if let Some(&index) = self.global_index.get(&global.name) {
            let existing = &self.globals[index];
            if *existing != global {
                return Err(IrError::GlobalConflict { name: global.name });
            }
            return Ok(existing.address());
        }
        let address = global.address();
        self.global_index
            .insert(global.name.clone(), self.globals.len());
        self.globals.push(global);
        Ok(address)
    }

    pub fn global(&self, name: &str) -> Option<&Global> {
        self.global_index.get(name).map(|&i| &self.globals[i])
    }

    // ── Functions ───────────────────────────────────────────────────

    /// Declare a function signature. A body is attached later by creating
    /// blocks on the returned function.
    pub fn declare_function(
        &mut self,
        name: &str,
        params: Vec<Param>,
        ret: IrType,
    ) -> Result<FuncId, IrError> {
        let candidate = Function::new(name, params, ret);
        if let Some(&id) = self.function_index.get(name) {
            let existing = self.functions[id.index()].signature();
            let new = candidate.signature();
            if existing != new {
                return Err(IrError::FunctionConflict {
                    name: name.to_owned(),
                    existing,
                    new,
                });
            }
            return Ok(id);
        }
        let id = FuncId::from_index(self.functions.len()).ok_or(IrError::TooManyFunctions)?;
        self.function_index.insert(name.to_owned(), id);
        self.functions.push(candidate);
        Ok(id)
    }

    pub fn function_id(&self, name: &str) -> Option<FuncId> {
        self.function_index.get(name).copied()
    }

    pub fn function(&self, id: FuncId) -> Result<&Function, IrError> {
        self.functions
            .get(id.index())
            .ok_or_else(|| IrError::UnknownFunction(format!("#{}", id.raw())))
    }

    pub fn function_mut(&mut self, id: FuncId) -> Result<&mut Function, IrError> {
        self.functions
            .get_mut(id.index())
            .ok_or_else(|| IrError::UnknownFunction(format!("#{}", id.raw())))
    }

    pub fn function_by_name(&self, name: &str) -> Option<&Function> {
        self.function_id(name).map(|id| &self.functions[id.index()])
    }

    /// Callee operand for a declared function.
    pub fn function_ref(&self, id: FuncId) -> Result<Value, IrError> {
        let func = self.function(id)?;
        Ok(Value::Global {
            name: func.name.clone(),
            ty: func.signature(),
        })
    }

    // ── Read access for the serializer ──────────────────────────────

    pub fn all_types(&self) -> &[TypeDef] {
        &self.types
    }

    pub fn all_globals(&self) -> &[Global] {
        &self.globals
    }

    pub fn all_functions(&self) -> &[Function] {
        &self.functions
    }

    // ── Layout ──────────────────────────────────────────────────────

    /// Size in bytes, with C-style field padding.
    pub fn size_of(&self, ty: &IrType) -> u64 {
        self.layout(ty, 0).0
    }

    pub fn align_of(&self, ty: &IrType) -> u64 {
        self.layout(ty, 0).1
    }

    fn layout(&self, ty: &IrType, depth: u32) -> (u64, u64) {
        if depth > MAX_LAYOUT_DEPTH {
            return (0, 1);
        }
        match ty {
            IrType::Prim(p) => {
                let size = p.size();
                (size, size.max(1))
            }
            IrType::Ptr { .. } | IrType::Func { .. } => (8, 8),
            IrType::Slice(_) => (16, 8),
            IrType::Array { elem, len } => {
                let (size, align) = self.layout(elem, depth + 1);
                (size.saturating_mul(*len), align)
            }
            IrType::Struct(name) => {
                let Some(fields) = self.struct_fields(name) else {
                    return (0, 1);
                };
                let mut offset = 0u64;
                let mut max_align = 1u64;
                for field in fields {
                    let (size, align) = self.layout(field, depth + 1);
                    offset = offset.next_multiple_of(align) + size;
                    max_align = max_align.max(align);
                }
                (offset.next_multiple_of(max_align), max_align)
            }
            IrType::Label | IrType::Opaque(_) => (0, 1),
        }
    }
}

fn render_fields(fields: &[IrType]) -> String {
    let parts: Vec<String> = fields.iter().map(ToString::to_string).collect();
    format!("{{ {} }}", parts.join(", "))
}

#[cfg(test)]
mod tests;
