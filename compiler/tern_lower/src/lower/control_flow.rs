//! Control flow lowering: blocks, `let`, `if`, `while`, `loop`, `break`,
//! `continue` and `return`.
//!
//! These are the constructs that create blocks. Each one starts in the
//! current block and leaves the builder positioned at its merge or exit
//! block. An arm or body that terminated itself (through `break`,
//! `continue` or `return`) gets no fallthrough jump.

use tern_ir::{ExprId, Pattern, ScopeId, Span, Stmt, StmtRange, TyId};
use tern_vir::{BlockId, Value};

use super::operators::expect_bool;
use super::ExprLowerer;
use crate::env::Binding;
use crate::LowerError;

impl ExprLowerer<'_, '_> {
    /// Block currently holding the cursor, if any.
    fn open_block(&self) -> Option<BlockId> {
        self.cx.builder.cursor().map(|c| c.block)
    }

    // ── Block ──────────────────────────────────────────────────

    /// Statements in order, then the tail. Statements after the block has
    /// terminated are unreachable and skipped.
    pub(crate) fn lower_block(
        &mut self,
        scope: ScopeId,
        stmts: StmtRange,
        tail: ExprId,
    ) -> Result<Value, LowerError> {
        let arena = self.arena;
        self.with_scope(scope, |this| {
            for stmt in arena.get_stmts(stmts) {
                if !this.live() {
                    break;
                }
                this.lower_stmt(*stmt)?;
            }
            if !this.live() {
                return Ok(Value::unreachable());
            }
            match tail.valid() {
                Some(tail) => this.lower_expr(tail),
                None => Ok(Value::unit()),
            }
        })
    }

    fn lower_stmt(&mut self, stmt: Stmt) -> Result<(), LowerError> {
        match stmt {
            Stmt::Let {
                pattern,
                ty,
                init,
                span,
            } => self.lower_let(pattern, ty, init, span),
            Stmt::Expr(expr) | Stmt::Semi(expr) => {
                self.lower_expr(expr)?;
                Ok(())
            }
            Stmt::Item(span) => Err(LowerError::Unsupported {
                what: "nested item",
                span,
            }),
        }
    }

    // ── Let ────────────────────────────────────────────────────

    /// `let` binds an SSA value when the binding is immutable and
    /// initialised; otherwise it reserves a stack slot named after the
    /// variable.
    fn lower_let(
        &mut self,
        pattern: Pattern,
        ty: TyId,
        init: ExprId,
        span: Span,
    ) -> Result<(), LowerError> {
        let (name, mutable) = match pattern {
            Pattern::Ident { name, mutable } => (name, mutable),
            Pattern::Wildcard => {
                if let Some(init) = init.valid() {
                    self.lower_expr(init)?;
                }
                return Ok(());
            }
            Pattern::Tuple => {
                return Err(LowerError::Unsupported {
                    what: "destructuring pattern",
                    span,
                })
            }
        };

        let value = match init.valid() {
            Some(init) => {
                let value = self.lower_expr(init)?;
                if !self.live() {
                    return Ok(());
                }
                Some(value)
            }
            None => None,
        };

        // Address-taken lets get their slot here, so every place use
        // shares one store that dominates it.
        match value {
            Some(value) if !mutable && !self.address_taken.contains(&name) => {
                self.cx.builder.pin(&value);
                self.cx.env.bind(name, Binding::Value(value));
            }
            value => {
                // A deferred initialiser needs one assignment.
                let mutable = mutable || value.is_none();
                let declared = if ty == TyId::INFER {
                    init.valid().map_or(ty, |init| self.arena.ty(init))
                } else {
                    ty
                };
                let ty = self.cx.map_type(declared)?;
                let var = self.cx.name_str(name);
                let addr = self.cx.builder.alloca(ty.clone(), Some(var))?;
                if let Some(value) = value {
                    self.cx.builder.store(addr.clone(), value)?;
                }
                self.cx.env.bind(
                    name,
                    Binding::Slot { addr, ty, mutable },
                );
            }
        }
        Ok(())
    }

    // ── If ─────────────────────────────────────────────────────

    /// ```text
    /// cur:   br cond, %then, %else     (no else arm: %merge)
    /// then:  ... jmp %merge
    /// else:  ... jmp %merge
    /// merge: phi of the live arms' values
    /// ```
    ///
    /// Without an else arm the merge block is created up front because the
    /// branch targets it. With one, it is only created if an arm falls
    /// through.
    pub(crate) fn lower_if(
        &mut self,
        cond: ExprId,
        then_branch: ExprId,
        else_branch: ExprId,
        ty: TyId,
        span: Span,
    ) -> Result<Value, LowerError> {
        let cond = self.lower_expr(cond)?;
        if !self.live() {
            return Ok(Value::unreachable());
        }
        expect_bool(&cond, span)?;

        let func = self.current_function()?;
        let then_block = self.cx.builder.new_block("then")?;
        let Some(else_branch) = else_branch.valid() else {
            let merge = self.cx.builder.new_block("merge")?;
            self.cx.builder.branch(cond, then_block, merge)?;
            self.cx.builder.position_at(func, then_block)?;
            self.lower_expr(then_branch)?;
            if self.live() {
                self.cx.builder.jump(merge)?;
            }
            self.cx.builder.position_at(func, merge)?;
            return Ok(Value::unit());
        };

        let else_block = self.cx.builder.new_block("else")?;
        self.cx.builder.branch(cond, then_block, else_block)?;

        let mut incoming = Vec::with_capacity(2);
        for (block, arm) in [(then_block, then_branch), (else_block, else_branch)] {
            self.cx.builder.position_at(func, block)?;
            let value = self.lower_expr(arm)?;
            if let Some(end) = self.open_block() {
                incoming.push((value, end));
            }
        }
        if incoming.is_empty() {
            return Ok(Value::unreachable());
        }

        // Jumps are emitted after both arms so the merge block is numbered
        // after everything the arms created.
        let merge = self.cx.builder.new_block("merge")?;
        for (_, end) in &incoming {
            self.cx.builder.position_at(func, *end)?;
            self.cx.builder.jump(merge)?;
        }
        self.cx.builder.position_at(func, merge)?;

        let result_ty = self.cx.map_type(ty)?;
        if result_ty.is_void() {
            return Ok(Value::unit());
        }
        // An arm that diverges without closing its block (`loop {}`) still
        // reaches the merge; its stand-in value takes the result type.
        let incoming: Vec<_> = incoming
            .into_iter()
            .map(|(value, end)| {
                if value.is_undef() {
                    (Value::Undef(result_ty.clone()), end)
                } else {
                    (value, end)
                }
            })
            .collect();
        match <[_; 1]>::try_from(incoming) {
            Ok([(value, _)]) => Ok(value),
            Err(incoming) => self.cx.builder.phi(result_ty, incoming),
        }
    }

    // ── Loops ──────────────────────────────────────────────────

    /// ```text
    /// cur:   jmp %cond
    /// cond:  br c, %body, %exit
    /// body:  ... jmp %cond
    /// exit:
    /// ```
    pub(crate) fn lower_while(
        &mut self,
        cond: ExprId,
        body: ExprId,
        span: Span,
    ) -> Result<Value, LowerError> {
        let func = self.current_function()?;
        let cond_block = self.cx.builder.new_block("while.cond")?;
        self.cx.builder.jump(cond_block)?;
        self.cx.builder.position_at(func, cond_block)?;
        let cond = self.lower_expr(cond)?;
        if !self.live() {
            return Ok(Value::unreachable());
        }
        expect_bool(&cond, span)?;

        // Created only once the condition can fall through to them.
        let body_block = self.cx.builder.new_block("while.body")?;
        let exit = self.cx.builder.new_block("while.exit")?;
        self.cx.builder.branch(cond, body_block, exit)?;

        self.cx.builder.position_at(func, body_block)?;
        self.cx.env.push_loop(exit, cond_block);
        let lowered = self.lower_expr(body);
        self.cx.env.pop_loop();
        lowered?;
        if self.live() {
            self.cx.builder.jump(cond_block)?;
        }

        self.cx.builder.position_at(func, exit)?;
        Ok(Value::unit())
    }

    /// ```text
    /// cur:   jmp %body
    /// body:  ... jmp %body
    /// exit:
    /// ```
    ///
    /// `break` is the only way out. A loop of type `!` still leaves the
    /// builder at its (unreachable) exit block and yields `undef`.
    pub(crate) fn lower_loop(&mut self, body: ExprId, ty: TyId) -> Result<Value, LowerError> {
        let func = self.current_function()?;
        let body_block = self.cx.builder.new_block("loop.body")?;
        let exit = self.cx.builder.new_block("loop.exit")?;

        self.cx.builder.jump(body_block)?;
        self.cx.builder.position_at(func, body_block)?;
        self.cx.env.push_loop(exit, body_block);
        let lowered = self.lower_expr(body);
        self.cx.env.pop_loop();
        lowered?;
        if self.live() {
            self.cx.builder.jump(body_block)?;
        }

        self.cx.builder.position_at(func, exit)?;
        if ty == TyId::NEVER {
            Ok(Value::unreachable())
        } else {
            Ok(Value::unit())
        }
    }

    pub(crate) fn lower_break(&mut self, span: Span) -> Result<Value, LowerError> {
        let target = self
            .cx
            .env
            .current_break_target()
            .ok_or(LowerError::OutsideLoop {
                keyword: "break",
                span,
            })?;
        self.cx.builder.jump(target)?;
        Ok(Value::unreachable())
    }

    pub(crate) fn lower_continue(&mut self, span: Span) -> Result<Value, LowerError> {
        let target = self
            .cx
            .env
            .current_continue_target()
            .ok_or(LowerError::OutsideLoop {
                keyword: "continue",
                span,
            })?;
        self.cx.builder.jump(target)?;
        Ok(Value::unreachable())
    }

    pub(crate) fn lower_return(&mut self, value: ExprId, span: Span) -> Result<Value, LowerError> {
        let ret = self
            .cx
            .env
            .current_return()
            .cloned()
            .ok_or(LowerError::ReturnOutsideFunction { span })?;
        let value = match value.valid() {
            Some(value) => {
                let value = self.lower_expr(value)?;
                if !self.live() {
                    return Ok(Value::unreachable());
                }
                (!ret.is_void()).then_some(value)
            }
            None => None,
        };
        self.cx.builder.ret(value)?;
        Ok(Value::unreachable())
    }
}
