//! Fixture builder for lowering tests.
//!
//! Builds a [`ResolvedCrate`] the way the resolver would: items in source
//! order, a function symbol per `fn` in the root scope, one scope per
//! function for its parameters and one per block.

#![allow(clippy::unwrap_used)]

use tern_ir::{
    BinaryOp, ConstDecl, ConstValue, ExprId, ExprKind, FieldInit, FnDecl, ImplBlock, Item, Name,
    Namespace, Param, Pattern, ResolvedCrate, ScopeId, Span, Stmt, StringInterner, StructDecl,
    Symbol, TyId, UnaryOp,
};
use tern_vir::{IrType, Module, Value};

use crate::lower::collect_address_taken;
use crate::{lower_crate, CodegenContext, Cursor, ExprLowerer, LowerError, LowerOptions};

/// A function whose body is being built.
pub(crate) struct FnSpec {
    decl: FnDecl,
    /// Scope of the function's outermost block.
    pub body_scope: ScopeId,
}

pub(crate) struct CrateBuilder {
    pub interner: StringInterner,
    pub krate: ResolvedCrate,
    next_offset: u32,
}

impl CrateBuilder {
    pub fn new() -> Self {
        Self {
            interner: StringInterner::new(),
            krate: ResolvedCrate::new(),
            next_offset: 0,
        }
    }

    pub fn name(&self, text: &str) -> Name {
        self.interner.intern(text)
    }

    fn next_span(&mut self) -> Span {
        let start = self.next_offset;
        self.next_offset += 2;
        Span::new(start, start + 1)
    }

    // ── Types and items ────────────────────────────────────────

    pub fn struct_ty(&mut self, name: &str, fields: &[(&str, TyId)]) -> TyId {
        let name = self.name(name);
        let fields = fields.iter().map(|(f, ty)| (self.name(f), *ty)).collect();
        let ty = self.krate.types.struct_ty(name, fields);
        self.krate
            .scopes
            .define(ScopeId::ROOT, Namespace::Type, name, Symbol::Struct { ty });
        let span = self.next_span();
        self.krate
            .items
            .push(Item::Struct(StructDecl { name, ty, span }));
        ty
    }

    pub fn const_item(&mut self, name: &str, ty: TyId, value: ConstValue) {
        let name = self.name(name);
        self.krate.scopes.define(
            ScopeId::ROOT,
            Namespace::Value,
            name,
            Symbol::Const {
                link_name: name,
                ty,
            },
        );
        let span = self.next_span();
        self.krate.items.push(Item::Const(ConstDecl {
            name,
            ty,
            value,
            span,
        }));
    }

    /// Open a function. Parameters are `(name, type, mutable)`.
    pub fn begin_fn(&mut self, name: &str, params: &[(&str, TyId, bool)], ret: TyId) -> FnSpec {
        let name = self.name(name);
        let param_tys: Vec<TyId> = params.iter().map(|(_, ty, _)| *ty).collect();
        let fn_ty = self.krate.types.function(&param_tys, ret);
        self.krate.scopes.define(
            ScopeId::ROOT,
            Namespace::Value,
            name,
            Symbol::Function {
                link_name: name,
                ty: fn_ty,
            },
        );

        let scope = self.krate.scopes.push_child(ScopeId::ROOT);
        let params = params
            .iter()
            .map(|(param, ty, mutable)| {
                let name = self.name(param);
                self.krate
                    .scopes
                    .define(scope, Namespace::Value, name, Symbol::Local { ty: *ty });
                Param {
                    name,
                    ty: *ty,
                    mutable: *mutable,
                    span: Span::DUMMY,
                }
            })
            .collect();
        let body_scope = self.krate.scopes.push_child(scope);
        let span = self.next_span();
        FnSpec {
            decl: FnDecl {
                name,
                link_name: name,
                params,
                ret,
                body: None,
                scope,
                span,
            },
            body_scope,
        }
    }

    pub fn end_fn(&mut self, mut spec: FnSpec, body: ExprId) {
        spec.decl.body = Some(body);
        self.krate.items.push(Item::Fn(spec.decl));
    }

    /// Close a function as the only member of `impl <self_ty>`; it is
    /// emitted as `<Type>.<fn>`.
    pub fn end_assoc_fn(&mut self, mut spec: FnSpec, self_ty: TyId, body: ExprId) {
        let type_name = self
            .krate
            .types
            .struct_def(self_ty)
            .map_or("", |def| self.interner.lookup(def.name));
        let fn_name = self.interner.lookup(spec.decl.name);
        let link_name = self.name(&format!("{type_name}.{fn_name}"));
        let param_tys: Vec<TyId> = spec.decl.params.iter().map(|p| p.ty).collect();
        let ty = self.krate.types.function(&param_tys, spec.decl.ret);
        self.krate.scopes.define(
            ScopeId::ROOT,
            Namespace::Value,
            spec.decl.name,
            Symbol::Function { link_name, ty },
        );
        spec.decl.link_name = link_name;
        spec.decl.body = Some(body);
        self.krate.items.push(Item::Impl(ImplBlock {
            self_ty,
            fns: vec![spec.decl],
            span: Span::DUMMY,
        }));
    }

    /// Declare a body-less function.
    pub fn extern_fn(&mut self, name: &str, params: &[TyId], ret: TyId) {
        let names: Vec<String> = (0..params.len()).map(|i| format!("p{i}")).collect();
        let params: Vec<(&str, TyId, bool)> = names
            .iter()
            .zip(params)
            .map(|(name, ty)| (name.as_str(), *ty, false))
            .collect();
        let spec = self.begin_fn(name, &params, ret);
        self.krate.items.push(Item::Fn(spec.decl));
    }

    pub fn child_scope(&mut self, parent: ScopeId) -> ScopeId {
        self.krate.scopes.push_child(parent)
    }

    // ── Expressions ────────────────────────────────────────────

    pub fn expr(&mut self, kind: ExprKind, ty: TyId) -> ExprId {
        let span = self.next_span();
        self.krate.arena.alloc(kind, span, ty)
    }

    pub fn expr_at(&mut self, kind: ExprKind, ty: TyId, span: Span) -> ExprId {
        self.krate.arena.alloc(kind, span, ty)
    }

    pub fn int(&mut self, value: u64, ty: TyId) -> ExprId {
        self.expr(ExprKind::Int(value), ty)
    }

    pub fn bool(&mut self, value: bool) -> ExprId {
        self.expr(ExprKind::Bool(value), TyId::BOOL)
    }

    pub fn unit(&mut self) -> ExprId {
        self.expr(ExprKind::Unit, TyId::UNIT)
    }

    pub fn str_lit(&mut self, text: &str) -> ExprId {
        let text = self.name(text);
        let ty = self.krate.types.reference(TyId::STR, false);
        self.expr(ExprKind::Str(text), ty)
    }

    pub fn path(&mut self, name: &str, ty: TyId) -> ExprId {
        self.qualified_path(&[name], ty)
    }

    pub fn qualified_path(&mut self, segments: &[&str], ty: TyId) -> ExprId {
        let names: Vec<Name> = segments.iter().map(|s| self.name(s)).collect();
        let range = self.krate.arena.push_names(&names);
        self.expr(ExprKind::Path(range), ty)
    }

    pub fn binary(&mut self, op: BinaryOp, lhs: ExprId, rhs: ExprId, ty: TyId) -> ExprId {
        self.expr(ExprKind::Binary { op, lhs, rhs }, ty)
    }

    pub fn unary(&mut self, op: UnaryOp, operand: ExprId, ty: TyId) -> ExprId {
        self.expr(ExprKind::Unary { op, operand }, ty)
    }

    pub fn assign(&mut self, target: ExprId, value: ExprId) -> ExprId {
        self.expr(ExprKind::Assign { target, value }, TyId::UNIT)
    }

    pub fn compound_assign(&mut self, op: BinaryOp, target: ExprId, value: ExprId) -> ExprId {
        self.expr(ExprKind::CompoundAssign { op, target, value }, TyId::UNIT)
    }

    pub fn borrow(&mut self, mutable: bool, operand: ExprId) -> ExprId {
        let pointee = self.krate.arena.ty(operand);
        let ty = self.krate.types.reference(pointee, mutable);
        self.expr(ExprKind::Borrow { mutable, operand }, ty)
    }

    pub fn deref(&mut self, operand: ExprId, ty: TyId) -> ExprId {
        self.expr(ExprKind::Deref(operand), ty)
    }

    pub fn cast(&mut self, operand: ExprId, to: TyId) -> ExprId {
        self.expr(ExprKind::Cast(operand), to)
    }

    pub fn block(
        &mut self,
        scope: ScopeId,
        stmts: &[Stmt],
        tail: Option<ExprId>,
        ty: TyId,
    ) -> ExprId {
        let stmts = self.krate.arena.push_stmts(stmts);
        let tail = tail.unwrap_or(ExprId::INVALID);
        self.expr(ExprKind::Block { scope, stmts, tail }, ty)
    }

    pub fn if_else(
        &mut self,
        cond: ExprId,
        then_branch: ExprId,
        else_branch: Option<ExprId>,
        ty: TyId,
    ) -> ExprId {
        self.expr(
            ExprKind::If {
                cond,
                then_branch,
                else_branch: else_branch.unwrap_or(ExprId::INVALID),
            },
            ty,
        )
    }

    pub fn while_loop(&mut self, cond: ExprId, body: ExprId) -> ExprId {
        self.expr(ExprKind::While { cond, body }, TyId::UNIT)
    }

    pub fn loop_expr(&mut self, body: ExprId, ty: TyId) -> ExprId {
        self.expr(ExprKind::Loop { body }, ty)
    }

    pub fn break_expr(&mut self) -> ExprId {
        self.expr(ExprKind::Break, TyId::NEVER)
    }

    pub fn continue_expr(&mut self) -> ExprId {
        self.expr(ExprKind::Continue, TyId::NEVER)
    }

    pub fn ret(&mut self, value: Option<ExprId>) -> ExprId {
        self.expr(ExprKind::Return(value.unwrap_or(ExprId::INVALID)), TyId::NEVER)
    }

    pub fn call(&mut self, callee: &str, args: &[ExprId], ret: TyId) -> ExprId {
        let callee = self.path(callee, TyId::INFER);
        let args = self.krate.arena.push_expr_list(args);
        self.expr(ExprKind::Call { callee, args }, ret)
    }

    pub fn struct_lit(&mut self, ty: TyId, fields: &[(&str, ExprId)]) -> ExprId {
        let inits: Vec<FieldInit> = fields
            .iter()
            .map(|(name, value)| FieldInit {
                name: self.name(name),
                value: *value,
                span: Span::DUMMY,
            })
            .collect();
        let fields = self.krate.arena.push_field_inits(&inits);
        self.expr(ExprKind::StructLit { fields }, ty)
    }

    pub fn field(&mut self, base: ExprId, field: &str, ty: TyId) -> ExprId {
        let field = self.name(field);
        self.expr(ExprKind::Field { base, field }, ty)
    }

    pub fn index(&mut self, base: ExprId, index: ExprId, ty: TyId) -> ExprId {
        self.expr(ExprKind::Index { base, index }, ty)
    }

    pub fn array(&mut self, elems: &[ExprId], ty: TyId) -> ExprId {
        let elems = self.krate.arena.push_expr_list(elems);
        self.expr(ExprKind::Array(elems), ty)
    }

    // ── Statements ─────────────────────────────────────────────

    pub fn let_stmt(&mut self, name: &str, mutable: bool, ty: TyId, init: Option<ExprId>) -> Stmt {
        Stmt::Let {
            pattern: Pattern::Ident {
                name: self.name(name),
                mutable,
            },
            ty,
            init: init.unwrap_or(ExprId::INVALID),
            span: self.next_span(),
        }
    }

    // ── Lowering ───────────────────────────────────────────────

    pub fn lower(&self) -> Result<Module, LowerError> {
        lower_crate(&self.krate, &self.interner, &LowerOptions::default())
    }

    /// Lower `expr` inside a fresh `void` function named `scratch` and stop
    /// there: no closing `ret` is added. Returns the module, the value and
    /// where the builder was left.
    pub fn lower_open(&self, expr: ExprId) -> Result<(Module, Value, Option<Cursor>), LowerError> {
        let mut cx = CodegenContext::new(&self.krate, &self.interner, &LowerOptions::default());
        let id = cx
            .builder
            .module_mut()
            .declare_function("scratch", vec![], IrType::UNIT)?;
        let entry = cx.builder.module_mut().function_mut(id)?.entry();
        cx.builder.position_at(id, entry)?;
        cx.env.push_function(IrType::UNIT);
        let mut lowerer = ExprLowerer::new(&mut cx);
        lowerer.address_taken =
            collect_address_taken(&self.krate.arena, &self.krate.types, expr);
        let value = lowerer.lower_expr(expr)?;
        let cursor = cx.builder.cursor();
        Ok((cx.finish(), value, cursor))
    }

    /// Lower and render, panicking on failure.
    pub fn render(&self) -> String {
        self.lower().unwrap().render()
    }
}
