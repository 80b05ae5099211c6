//! Per-crate lowering state.
//!
//! [`CodegenContext`] owns the builder (and through it the module), the
//! value environment, the type mapper and the string-literal table. It also
//! carries the "current scope" cursor used to query the resolver's scope
//! chain.

use rustc_hash::FxHashMap;
use tern_ir::{
    ConstDecl, ConstValue, FnDecl, Name, Namespace, ResolvedCrate, ScopeId, StringInterner,
    Span, Symbol, TyId, TyKind,
};
use tern_vir::{Constant, FuncId, Global, IrType, Module, Param, Value};

use crate::builder::IrBuilder;
use crate::env::ValueEnv;
use crate::type_mapper::TypeMapper;
use crate::{LowerError, LowerOptions};

pub struct CodegenContext<'a> {
    pub krate: &'a ResolvedCrate,
    pub interner: &'a StringInterner,
    pub builder: IrBuilder,
    pub env: ValueEnv,
    types: TypeMapper,
    /// Literal text → address of its `.str.N` global.
    strings: FxHashMap<String, Value>,
    current_scope: ScopeId,
}

impl<'a> CodegenContext<'a> {
    pub fn new(
        krate: &'a ResolvedCrate,
        interner: &'a StringInterner,
        options: &LowerOptions,
    ) -> Self {
        Self {
            krate,
            interner,
            builder: IrBuilder::new(Module::new(options.module_name.clone()), options),
            env: ValueEnv::new(),
            types: TypeMapper::new(),
            strings: FxHashMap::default(),
            current_scope: ScopeId::ROOT,
        }
    }

    pub fn finish(self) -> Module {
        self.builder.finish()
    }

    pub fn name_str(&self, name: Name) -> &'a str {
        self.interner.lookup(name)
    }

    pub fn map_type(&mut self, ty: TyId) -> Result<IrType, LowerError> {
        self.types.map(
            &self.krate.types,
            self.interner,
            self.builder.module_mut(),
            ty,
        )
    }

    // ── Scope cursor ───────────────────────────────────────────

    pub fn current_scope(&self) -> ScopeId {
        self.current_scope
    }

    /// Enter `scope` for both name lookup and local bindings. Returns the
    /// scope to hand back to [`leave_scope`](Self::leave_scope).
    pub fn enter_scope(&mut self, scope: ScopeId) -> ScopeId {
        self.env.enter_scope();
        std::mem::replace(&mut self.current_scope, scope)
    }

    pub fn leave_scope(&mut self, saved: ScopeId) {
        self.env.leave_scope();
        self.current_scope = saved;
    }

    /// Look `name` up in the resolver's scope chain from the current scope.
    pub fn resolve_symbol(&self, name: Name, ns: Namespace) -> Option<Symbol> {
        self.krate
            .scopes
            .resolve(self.current_scope, name, ns)
            .copied()
    }

    // ── Declarations ───────────────────────────────────────────

    /// Declare a function's signature under its link name.
    pub fn declare_fn(&mut self, decl: &FnDecl) -> Result<FuncId, LowerError> {
        let params = decl
            .params
            .iter()
            .map(|p| {
                Ok(Param {
                    name: self.name_str(p.name).to_owned(),
                    ty: self.map_type(p.ty)?,
                })
            })
            .collect::<Result<Vec<_>, LowerError>>()?;
        let ret = self.map_type(decl.ret)?;
        let name = self.name_str(decl.link_name);
        Ok(self.builder.module_mut().declare_function(name, params, ret)?)
    }

    /// The function a call resolves to, declaring it from its resolved
    /// type if no item declared it yet.
    pub fn function_for_symbol(
        &mut self,
        link_name: Name,
        ty: TyId,
        span: Span,
    ) -> Result<FuncId, LowerError> {
        let name = self.name_str(link_name);
        if let Some(id) = self.builder.module().function_id(name) {
            return Ok(id);
        }
        let krate = self.krate;
        let TyKind::Fn { params, ret } = krate.types.kind(ty) else {
            return Err(LowerError::NotAFunction {
                name: name.to_owned(),
                span,
            });
        };
        let params = params
            .iter()
            .enumerate()
            .map(|(i, p)| {
                Ok(Param {
                    name: format!("arg{i}"),
                    ty: self.map_type(*p)?,
                })
            })
            .collect::<Result<Vec<_>, LowerError>>()?;
        let ret = self.map_type(*ret)?;
        Ok(self.builder.module_mut().declare_function(name, params, ret)?)
    }

    /// Declare a `const` item as a module global.
    pub fn declare_const(&mut self, decl: &ConstDecl) -> Result<Value, LowerError> {
        let ty = self.map_type(decl.ty)?;
        let global = Global {
            name: self.name_str(decl.name).to_owned(),
            ty,
            init: const_to_ir(&decl.value),
        };
        Ok(self.builder.module_mut().declare_global(global)?)
    }

    // ── String literals ────────────────────────────────────────

    /// Address of the global holding `text`, created on first use.
    pub fn intern_string(&mut self, text: &str) -> Result<Value, LowerError> {
        if let Some(global) = self.strings.get(text) {
            return Ok(global.clone());
        }
        let bytes = text.as_bytes().to_vec();
        let global = Global {
            name: format!(".str.{}", self.strings.len()),
            ty: IrType::array(IrType::U8, bytes.len() as u64),
            init: Constant::Bytes(bytes),
        };
        let address = self.builder.module_mut().declare_global(global)?;
        tracing::trace!(global = %address, len = text.len(), "interned string literal");
        self.strings.insert(text.to_owned(), address.clone());
        Ok(address)
    }

    /// A string literal as a `slice u8` constant over its interned global.
    pub fn string_literal(&mut self, text: &str) -> Result<Value, LowerError> {
        let address = self.intern_string(text)?;
        let Value::Global { name, .. } = address else {
            return Err(LowerError::Unsupported {
                what: "string literal",
                span: Span::DUMMY,
            });
        };
        Ok(Value::Const {
            value: Constant::Slice {
                global: name,
                len: text.len() as u64,
            },
            ty: IrType::slice(IrType::U8),
        })
    }
}

fn const_to_ir(value: &ConstValue) -> Constant {
    match value {
        ConstValue::Int(v) => Constant::Int(i128::from(*v)),
        ConstValue::Bool(v) => Constant::Bool(*v),
        ConstValue::Char(c) => Constant::Char(*c),
        ConstValue::Array(items) => Constant::Array(items.iter().map(const_to_ir).collect()),
        ConstValue::Struct(fields) => Constant::Struct(fields.iter().map(const_to_ir).collect()),
    }
}
