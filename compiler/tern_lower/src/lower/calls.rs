//! Direct calls.
//!
//! The callee must be an unqualified name that the resolver's scope chain
//! maps to a function. Qualified paths, calls through locals and method
//! calls are rejected.

use tern_ir::{ExprId, ExprKind, ExprRange, Namespace, Span, Symbol};
use tern_vir::Value;

use super::ExprLowerer;
use crate::LowerError;

impl ExprLowerer<'_, '_> {
    /// Arguments are evaluated left to right and passed positionally.
    pub(crate) fn lower_call(
        &mut self,
        callee: ExprId,
        args: ExprRange,
        span: Span,
    ) -> Result<Value, LowerError> {
        let ExprKind::Path(segments) = *self.arena.kind(callee) else {
            return Err(LowerError::Unsupported {
                what: "indirect call",
                span,
            });
        };
        let name = self.single_segment(segments, span)?;
        if self.cx.env.resolve(name).is_some() {
            return Err(LowerError::Unsupported {
                what: "call through a local binding",
                span,
            });
        }

        let (link_name, ty) = match self.cx.resolve_symbol(name, Namespace::Value) {
            Some(Symbol::Function { link_name, ty }) => (link_name, ty),
            Some(_) => {
                return Err(LowerError::NotAFunction {
                    name: self.cx.name_str(name).to_owned(),
                    span,
                })
            }
            None => {
                return Err(LowerError::UnresolvedName {
                    name: self.cx.name_str(name).to_owned(),
                    span,
                })
            }
        };
        let id = self.cx.function_for_symbol(link_name, ty, span)?;
        let callee = self.cx.builder.module().function_ref(id)?;
        let ret = self.cx.builder.module().function(id)?.ret.clone();

        let arena = self.arena;
        let mut values = Vec::with_capacity(args.len());
        for arg in arena.get_expr_list(args) {
            let value = self.lower_expr(*arg)?;
            if !self.live() {
                return Ok(Value::unreachable());
            }
            values.push(value);
        }
        self.cx.builder.call(callee, values, ret)
    }
}
