//! The IR builder.
//!
//! The only component that mutates the module while a function is being
//! lowered. It follows the usual "position at a block, emit, terminate"
//! pattern:
//!
//! - [`IrBuilder::position_at`] moves the cursor. Moving into a different
//!   function resets the temporary counter, the alloca cursor and the set of
//!   used result names.
//! - Emission appends to the cursor's block and returns a typed register.
//!   Stack allocations are the exception: they are always inserted into the
//!   entry block at a monotonically advancing position, so every function
//!   has one contiguous allocation prologue.
//! - Setting a terminator clears the cursor. Callers check
//!   [`IrBuilder::has_insertion_point`] before emitting a fallthrough jump.
//!
//! # Aggregate-copy elision
//!
//! A store whose value is an aggregate register loaded earlier in the same
//! block, larger than the inline threshold, with no store, call or other use
//! of that register in between, is rewritten: the load is removed and the
//! bytes are moved with a call to the bulk-copy routine instead. Loads are
//! not barriers. Registers pinned by the lowerer (bound to a name) are
//! never rewritten, since they stay readable after the store.

use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use tern_vir::{
    BinOp, BlockId, CastKind, CmpPred, FuncId, InstKind, Instruction, IrType, Module, Param,
    Terminator, UnOp, Value, ValueName,
};

use crate::{LowerError, LowerOptions};

/// The active insertion point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cursor {
    pub func: FuncId,
    pub block: BlockId,
}

pub struct IrBuilder {
    module: Module,
    cursor: Option<Cursor>,
    /// Function the per-function state below belongs to.
    function: Option<FuncId>,
    next_temp: u32,
    alloca_cursor: usize,
    used_names: FxHashSet<String>,
    pinned: FxHashSet<ValueName>,
    inline_copy_threshold: u64,
    memcpy_symbol: String,
}

impl IrBuilder {
    pub fn new(module: Module, options: &LowerOptions) -> Self {
        Self {
            module,
            cursor: None,
            function: None,
            next_temp: 0,
            alloca_cursor: 0,
            used_names: FxHashSet::default(),
            pinned: FxHashSet::default(),
            inline_copy_threshold: options.inline_copy_threshold,
            memcpy_symbol: options.memcpy_symbol.clone(),
        }
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    pub fn module_mut(&mut self) -> &mut Module {
        &mut self.module
    }

    /// Hand the finished module over.
    pub fn finish(self) -> Module {
        self.module
    }

    // ── Cursor ─────────────────────────────────────────────────

    /// Position the cursor at the end of `block` in `func`.
    ///
    /// Fails if the block is unknown or already terminated.
    pub fn position_at(&mut self, func: FuncId, block: BlockId) -> Result<(), LowerError> {
        let function = self.module.function_mut(func)?;
        function.entry();
        let target = function.block(block)?;
        if target.is_terminated() {
            return Err(tern_vir::IrError::BlockTerminated {
                label: target.label.clone(),
            }
            .into());
        }

        if self.function != Some(func) {
            let function = self.module.function(func)?;
            self.next_temp = 0;
            self.alloca_cursor = function
                .block(BlockId::new(0))?
                .instructions()
                .iter()
                .take_while(|inst| inst.kind.is_alloca())
                .count();
            self.used_names = function.params.iter().map(|p| p.name.clone()).collect();
            self.pinned.clear();
            self.function = Some(func);
            tracing::trace!(function = %function.name, "builder entered function");
        }

        self.cursor = Some(Cursor { func, block });
        Ok(())
    }

    pub fn cursor(&self) -> Option<Cursor> {
        self.cursor
    }

    pub fn has_insertion_point(&self) -> bool {
        self.cursor.is_some()
    }

    /// The function being built, live cursor or not.
    pub fn current_function(&self) -> Result<FuncId, LowerError> {
        self.function.ok_or(LowerError::NoInsertionPoint)
    }

    /// Create a new block labelled `<hint>.<n>` in the current function.
    pub fn new_block(&mut self, hint: &str) -> Result<BlockId, LowerError> {
        let func = self.current_function()?;
        let function = self.module.function_mut(func)?;
        let id = function.add_block(hint)?;
        tracing::trace!(block = %function.label(id), "new block");
        Ok(id)
    }

    // ── Names ──────────────────────────────────────────────────

    pub fn fresh_name(&mut self) -> ValueName {
        let name = ValueName::Temp(self.next_temp);
        self.next_temp += 1;
        name
    }

    /// `base`, or `base.1`, `base.2`, ... if already taken in this function.
    pub fn unique_name(&mut self, base: &str) -> String {
        let mut candidate = base.to_owned();
        let mut n = 0u32;
        while self.used_names.contains(&candidate) {
            n += 1;
            candidate = format!("{base}.{n}");
        }
        self.used_names.insert(candidate.clone());
        candidate
    }

    /// Exclude `value` from aggregate-copy elision.
    pub fn pin(&mut self, value: &Value) {
        if let Some(name) = value.reg_name() {
            self.pinned.insert(name.clone());
        }
    }

    // ── Emission ───────────────────────────────────────────────

    /// Emit `kind` with a fresh temporary as its result.
    pub fn emit(&mut self, kind: InstKind, ty: IrType) -> Result<Value, LowerError> {
        match kind {
            InstKind::Alloca { allocated } => self.alloca(allocated, None),
            InstKind::Store { ptr, value } => {
                self.store(ptr, value)?;
                Ok(Value::unit())
            }
            kind => {
                let name = self.fresh_name();
                self.append(Instruction::new(name, ty, kind))
            }
        }
    }

    fn append(&mut self, inst: Instruction) -> Result<Value, LowerError> {
        let cursor = self.cursor.ok_or(LowerError::NoInsertionPoint)?;
        let result = inst.result();
        self.module
            .function_mut(cursor.func)?
            .block_mut(cursor.block)?
            .append(inst)?;
        Ok(result)
    }

    /// Reserve a stack slot for `ty` in the entry block's prologue.
    ///
    /// `var` names the slot `<var>.addr`; `None` uses a temporary.
    pub fn alloca(&mut self, ty: IrType, var: Option<&str>) -> Result<Value, LowerError> {
        let func = self.current_function()?;
        let name = match var {
            Some(var) => ValueName::Named(self.unique_name(&format!("{var}.addr"))),
            None => self.fresh_name(),
        };
        let inst = Instruction::new(
            name,
            IrType::ptr(ty.clone(), true),
            InstKind::Alloca { allocated: ty },
        );
        let result = inst.result();
        let function = self.module.function_mut(func)?;
        let entry = function.entry();
        function.block_mut(entry)?.insert(self.alloca_cursor, inst);
        self.alloca_cursor += 1;
        tracing::trace!(slot = %result, position = self.alloca_cursor - 1, "hoisted alloca");
        Ok(result)
    }

    pub fn load(&mut self, ptr: Value, ty: IrType) -> Result<Value, LowerError> {
        self.emit(InstKind::Load { ptr }, ty)
    }

    /// Store `value` through `ptr`, eliding large aggregate copies.
    pub fn store(&mut self, ptr: Value, value: Value) -> Result<(), LowerError> {
        if let Some(src) = self.take_aggregate_load(&value)? {
            return self.copy_aggregate(ptr, src, value.ty());
        }
        let name = self.fresh_name();
        self.append(Instruction::new(
            name,
            IrType::UNIT,
            InstKind::Store { ptr, value },
        ))?;
        Ok(())
    }

    pub fn binary(&mut self, op: BinOp, lhs: Value, rhs: Value) -> Result<Value, LowerError> {
        let ty = lhs.ty().clone();
        self.emit(InstKind::Binary { op, lhs, rhs }, ty)
    }

    pub fn unary(&mut self, op: UnOp, operand: Value) -> Result<Value, LowerError> {
        let ty = operand.ty().clone();
        self.emit(InstKind::Unary { op, operand }, ty)
    }

    pub fn cmp(&mut self, pred: CmpPred, lhs: Value, rhs: Value) -> Result<Value, LowerError> {
        self.emit(InstKind::Cmp { pred, lhs, rhs }, IrType::BOOL)
    }

    pub fn call(
        &mut self,
        callee: Value,
        args: Vec<Value>,
        ret: IrType,
    ) -> Result<Value, LowerError> {
        self.emit(InstKind::Call { callee, args }, ret)
    }

    /// Address of `indices` within the `base_ty` that `base` points at.
    /// The result points at `elem_ty` with `base`'s mutability.
    pub fn gep(
        &mut self,
        base_ty: IrType,
        base: Value,
        indices: SmallVec<[Value; 2]>,
        elem_ty: IrType,
    ) -> Result<Value, LowerError> {
        let mutable = base.ty().pointee().is_some_and(|(_, m)| m);
        self.emit(
            InstKind::Gep {
                base_ty,
                base,
                indices,
            },
            IrType::ptr(elem_ty, mutable),
        )
    }

    pub fn cast(&mut self, kind: CastKind, value: Value, to: IrType) -> Result<Value, LowerError> {
        self.emit(InstKind::Cast { kind, value }, to)
    }

    pub fn phi(
        &mut self,
        ty: IrType,
        incoming: Vec<(Value, BlockId)>,
    ) -> Result<Value, LowerError> {
        self.emit(InstKind::Phi { incoming }, ty)
    }

    // ── Terminators ────────────────────────────────────────────

    /// Set the current block's terminator and clear the cursor.
    pub fn terminate(&mut self, term: Terminator) -> Result<(), LowerError> {
        let cursor = self.cursor.ok_or(LowerError::NoInsertionPoint)?;
        self.module
            .function_mut(cursor.func)?
            .block_mut(cursor.block)?
            .set_terminator(term)?;
        self.cursor = None;
        Ok(())
    }

    pub fn jump(&mut self, target: BlockId) -> Result<(), LowerError> {
        self.terminate(Terminator::Jump(target))
    }

    pub fn branch(
        &mut self,
        cond: Value,
        then_block: BlockId,
        else_block: BlockId,
    ) -> Result<(), LowerError> {
        self.terminate(Terminator::Branch {
            cond,
            then_block,
            else_block,
        })
    }

    pub fn ret(&mut self, value: Option<Value>) -> Result<(), LowerError> {
        self.terminate(Terminator::Return(value))
    }

    // ── Aggregate-copy elision ─────────────────────────────────

    /// If `value` qualifies for elision, remove its defining load and return
    /// the address it loaded from.
    fn take_aggregate_load(&mut self, value: &Value) -> Result<Option<Value>, LowerError> {
        let ty = value.ty();
        if !ty.is_aggregate() || self.module.size_of(ty) <= self.inline_copy_threshold {
            return Ok(None);
        }
        let Some(name) = value.reg_name() else {
            return Ok(None);
        };
        if self.pinned.contains(name) {
            return Ok(None);
        }
        let Some(cursor) = self.cursor else {
            return Ok(None);
        };

        let block = self
            .module
            .function_mut(cursor.func)?
            .block_mut(cursor.block)?;
        let mut found = None;
        for (index, inst) in block.instructions().iter().enumerate().rev() {
            if inst.name == *name {
                if let InstKind::Load { ptr } = &inst.kind {
                    found = Some((index, ptr.clone()));
                }
                break;
            }
            if inst.kind.has_side_effects() || inst.uses(name) {
                break;
            }
        }

        let Some((index, src)) = found else {
            return Ok(None);
        };
        block.remove(index);
        tracing::trace!(value = %value, source = %src, "elided aggregate load");
        Ok(Some(src))
    }

    fn copy_aggregate(&mut self, dst: Value, src: Value, ty: &IrType) -> Result<(), LowerError> {
        let size = self.module.size_of(ty);
        let memcpy = self.memcpy_ref()?;
        let dst = self.cast(CastKind::Bitcast, dst, IrType::ptr(IrType::U8, true))?;
        let src = self.cast(CastKind::Bitcast, src, IrType::ptr(IrType::U8, false))?;
        self.call(
            memcpy,
            vec![dst, src, Value::int(i128::from(size), IrType::USIZE)],
            IrType::UNIT,
        )?;
        tracing::trace!(ty = %ty, size, "aggregate copy via bulk-copy call");
        Ok(())
    }

    /// The bulk-copy routine, declared on first use.
    fn memcpy_ref(&mut self) -> Result<Value, LowerError> {
        let params = vec![
            Param {
                name: "dst".to_owned(),
                ty: IrType::ptr(IrType::U8, true),
            },
            Param {
                name: "src".to_owned(),
                ty: IrType::ptr(IrType::U8, false),
            },
            Param {
                name: "len".to_owned(),
                ty: IrType::USIZE,
            },
        ];
        let id = self
            .module
            .declare_function(&self.memcpy_symbol, params, IrType::UNIT)?;
        Ok(self.module.function_ref(id)?)
    }
}
