//! Resolved tree → IR lowering.
//!
//! [`ExprLowerer`] walks one function body at a time and drives the
//! builder and value environment held by the [`CodegenContext`]. Every
//! expression lowers to a [`Value`]; expressions in lvalue position lower
//! to a [`Place`] instead.
//!
//! # Dead code
//!
//! `break`, `continue` and `return` terminate the current block and clear
//! the builder's cursor. From then on each construct returns
//! [`Value::unreachable`] without emitting, so an enclosing expression that
//! consumes the result is visibly unreachable and never touches a
//! terminated block.

mod address_taken;
mod aggregates;
mod calls;
mod control_flow;
mod literals;
mod operators;

pub(crate) use address_taken::collect_address_taken;

use rustc_hash::FxHashSet;
use tern_ir::{ExprArena, ExprId, ExprKind, FnDecl, Name, NameRange, Span, TypePool};
use tern_stack::ensure_sufficient_stack;
use tern_vir::{FuncId, IrType, Value};

use crate::context::CodegenContext;
use crate::env::Binding;
use crate::LowerError;

/// An address together with the type stored there.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Place {
    pub addr: Value,
    pub ty: IrType,
    pub mutable: bool,
}

impl Place {
    /// Stand-in for a place computed in dead code.
    fn unreachable() -> Self {
        Self {
            addr: Value::Undef(IrType::ptr(IrType::NEVER, true)),
            ty: IrType::NEVER,
            mutable: true,
        }
    }
}

// ── ExprLowerer ────────────────────────────────────────────────────

pub struct ExprLowerer<'cx, 'a> {
    pub(crate) cx: &'cx mut CodegenContext<'a>,
    pub(crate) arena: &'a ExprArena,
    pub(crate) pool: &'a TypePool,
    /// Immutable names of the current function that are bound to a slot.
    pub(crate) address_taken: FxHashSet<Name>,
}

impl<'cx, 'a> ExprLowerer<'cx, 'a> {
    pub fn new(cx: &'cx mut CodegenContext<'a>) -> Self {
        let krate = cx.krate;
        Self {
            cx,
            arena: &krate.arena,
            pool: &krate.types,
            address_taken: FxHashSet::default(),
        }
    }

    /// Whether the builder still has an open block to emit into.
    #[inline]
    pub(crate) fn live(&self) -> bool {
        self.cx.builder.has_insertion_point()
    }

    pub(crate) fn current_function(&self) -> Result<FuncId, LowerError> {
        self.cx.builder.current_function()
    }

    /// Run `f` inside `scope`; the scope is left again even when `f` fails.
    pub(crate) fn with_scope<T>(
        &mut self,
        scope: tern_ir::ScopeId,
        f: impl FnOnce(&mut Self) -> Result<T, LowerError>,
    ) -> Result<T, LowerError> {
        let saved = self.cx.enter_scope(scope);
        let result = f(self);
        self.cx.leave_scope(saved);
        result
    }

    // ── Functions ──────────────────────────────────────────────

    /// Lower `decl`'s body into the already declared function `id`.
    pub fn lower_function(&mut self, decl: &FnDecl, id: FuncId) -> Result<(), LowerError> {
        let Some(body) = decl.body else {
            return Ok(());
        };
        let name = self.cx.name_str(decl.link_name);
        let _span = tracing::debug_span!("lower_function", name).entered();

        let function = self.cx.builder.module_mut().function_mut(id)?;
        let entry = function.entry();
        let ret = function.ret.clone();
        self.cx.builder.position_at(id, entry)?;
        self.cx.env.push_function(ret.clone());
        self.address_taken = collect_address_taken(self.arena, self.pool, body);

        let result = self.with_scope(decl.scope, |this| {
            this.bind_params(decl, id)?;
            let value = this.lower_expr(body)?;
            if this.live() {
                let value = if ret.is_void() {
                    None
                } else if value.is_undef() {
                    Some(Value::Undef(ret.clone()))
                } else {
                    Some(value)
                };
                this.cx.builder.ret(value)?;
            }
            Ok(())
        });

        self.cx.env.pop_function();
        if result.is_ok() {
            let blocks = self.cx.builder.module().function(id)?.blocks().len();
            tracing::debug!(blocks, "lowered function");
        }
        result
    }

    /// Bind parameters. `mut` and address-taken parameters are spilled to
    /// a stack slot on entry.
    fn bind_params(&mut self, decl: &FnDecl, id: FuncId) -> Result<(), LowerError> {
        for (index, param) in decl.params.iter().enumerate() {
            let Some(value) = self.cx.builder.module().function(id)?.param_value(index) else {
                return Err(LowerError::UnresolvedName {
                    name: self.cx.name_str(param.name).to_owned(),
                    span: param.span,
                });
            };
            if param.mutable || self.address_taken.contains(&param.name) {
                let var = self.cx.name_str(param.name);
                let Place { addr, ty, .. } = self.spill(value, Some(var))?;
                self.cx.env.bind(
                    param.name,
                    Binding::Slot {
                        addr,
                        ty,
                        mutable: param.mutable,
                    },
                );
            } else {
                self.cx.env.bind(param.name, Binding::Param(value));
            }
        }
        Ok(())
    }

    // ── Main dispatch ──────────────────────────────────────────

    /// Lower an expression in value position.
    pub fn lower_expr(&mut self, id: ExprId) -> Result<Value, LowerError> {
        ensure_sufficient_stack(|| self.lower_expr_inner(id))
    }

    fn lower_expr_inner(&mut self, id: ExprId) -> Result<Value, LowerError> {
        if !self.live() {
            return Ok(Value::unreachable());
        }
        let node = self.arena.get(id);
        let span = node.span;

        match node.kind {
            // ── Literals and paths ─────────────────────────────
            ExprKind::Int(value) => self.lower_int(value, node.ty),
            ExprKind::Bool(value) => Ok(Value::bool(value)),
            ExprKind::Char(value) => Ok(Self::lower_char(value)),
            ExprKind::Str(text) => {
                let text = self.cx.name_str(text);
                self.cx.string_literal(text)
            }
            ExprKind::Unit => Ok(Value::unit()),
            ExprKind::Path(segments) => self.lower_path(segments, span),

            // ── Operators ──────────────────────────────────────
            ExprKind::Binary { op, lhs, rhs } => self.lower_binary(op, lhs, rhs, span),
            ExprKind::Unary { op, operand } => self.lower_unary(op, operand),
            ExprKind::Assign { target, value } => self.lower_assign(target, value, span),
            ExprKind::CompoundAssign { op, target, value } => {
                self.lower_compound_assign(op, target, value, span)
            }
            ExprKind::Borrow { mutable, operand } => self.lower_borrow(mutable, operand, span),
            ExprKind::Cast(operand) => self.lower_cast(operand, node.ty, span),
            ExprKind::Deref(_) | ExprKind::Field { .. } | ExprKind::Index { .. } => {
                let place = self.lower_place(id)?;
                if !self.live() {
                    return Ok(Value::unreachable());
                }
                self.load_place(place)
            }

            // ── Control flow ───────────────────────────────────
            ExprKind::Block { scope, stmts, tail } => self.lower_block(scope, stmts, tail),
            ExprKind::If {
                cond,
                then_branch,
                else_branch,
            } => self.lower_if(cond, then_branch, else_branch, node.ty, span),
            ExprKind::While { cond, body } => self.lower_while(cond, body, span),
            ExprKind::Loop { body } => self.lower_loop(body, node.ty),
            ExprKind::Break => self.lower_break(span),
            ExprKind::Continue => self.lower_continue(span),
            ExprKind::Return(value) => self.lower_return(value, span),

            // ── Calls and aggregates ───────────────────────────
            ExprKind::Call { callee, args } => self.lower_call(callee, args, span),
            ExprKind::StructLit { fields } => self.lower_struct_lit(fields, node.ty, span),
            ExprKind::Array(elems) => self.lower_array(elems, node.ty, span),

            ExprKind::MethodCall { .. } | ExprKind::Tuple(_) | ExprKind::Match { .. } => {
                Err(LowerError::Unsupported {
                    what: node.kind.describe(),
                    span,
                })
            }
        }
    }

    // ── Places ─────────────────────────────────────────────────

    /// Lower an expression in lvalue position to the address it denotes.
    ///
    /// Expressions without a home of their own (literals, calls, ...) are
    /// evaluated into a fresh immutable stack slot.
    pub(crate) fn lower_place(&mut self, id: ExprId) -> Result<Place, LowerError> {
        if !self.live() {
            return Ok(Place::unreachable());
        }
        let node = self.arena.get(id);
        let span = node.span;

        match node.kind {
            ExprKind::Path(segments) => self.lower_path_place(segments, span),
            ExprKind::Deref(operand) => {
                let ptr = self.lower_expr(operand)?;
                if !self.live() {
                    return Ok(Place::unreachable());
                }
                deref_place(ptr, span)
            }
            ExprKind::Field { base, field } => self.lower_field_place(base, field, span),
            ExprKind::Index { base, index } => self.lower_index_place(base, index, span),

            ExprKind::Assign { .. }
            | ExprKind::CompoundAssign { .. }
            | ExprKind::While { .. }
            | ExprKind::Loop { .. }
            | ExprKind::Break
            | ExprKind::Continue
            | ExprKind::Return(_) => Err(LowerError::NotAddressable {
                what: node.kind.describe(),
                span,
            }),

            _ => {
                let value = self.lower_expr(id)?;
                if !self.live() {
                    return Ok(Place::unreachable());
                }
                self.spill(value, None)
            }
        }
    }

    /// Read the value stored at `place`.
    pub(crate) fn load_place(&mut self, place: Place) -> Result<Value, LowerError> {
        self.cx.builder.load(place.addr, place.ty)
    }

    /// Store `value` into a fresh immutable slot.
    pub(crate) fn spill(&mut self, value: Value, var: Option<&str>) -> Result<Place, LowerError> {
        let ty = value.ty().clone();
        let addr = self.cx.builder.alloca(ty.clone(), var)?;
        self.cx.builder.store(addr.clone(), value)?;
        Ok(Place {
            addr,
            ty,
            mutable: false,
        })
    }

    fn lower_path_place(&mut self, segments: NameRange, span: Span) -> Result<Place, LowerError> {
        let name = self.single_segment(segments, span)?;
        match self.cx.env.resolve(name).cloned() {
            Some(Binding::Slot { addr, ty, mutable }) => Ok(Place { addr, ty, mutable }),
            Some(Binding::Value(value) | Binding::Param(value)) => {
                let var = self.cx.name_str(name);
                self.spill(value, Some(var))
            }
            None => self.lower_global_place(name, span),
        }
    }

    /// The single name of an unqualified path.
    pub(crate) fn single_segment(&self, segments: NameRange, span: Span) -> Result<Name, LowerError> {
        match self.arena.get_names(segments) {
            [name] => Ok(*name),
            [] => Err(LowerError::UnresolvedName {
                name: String::new(),
                span,
            }),
            names => Err(LowerError::QualifiedPath {
                path: names
                    .iter()
                    .map(|n| self.cx.name_str(*n))
                    .collect::<Vec<_>>()
                    .join("::"),
                span,
            }),
        }
    }
}

/// The place a pointer value points at.
pub(crate) fn deref_place(ptr: Value, span: Span) -> Result<Place, LowerError> {
    let Some((ty, mutable)) = ptr.ty().pointee().map(|(p, m)| (p.clone(), m)) else {
        return Err(LowerError::DerefNonPointer {
            found: ptr.ty().to_string(),
            span,
        });
    };
    Ok(Place {
        addr: ptr,
        ty,
        mutable,
    })
}
