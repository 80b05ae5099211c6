//! Value environment: lexical bindings and function frames.
//!
//! Scopes are an explicit stack of maps pushed and popped in lockstep with
//! the resolved tree's block nesting. Function frames carry the return type
//! and the loop-target stack, so a nested loop restores its enclosing
//! loop's targets when it is popped.

use rustc_hash::FxHashMap;
use tern_ir::Name;
use tern_vir::{BlockId, IrType, Value};

/// What a source name is bound to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Binding {
    /// Immutable SSA value, substituted directly.
    Value(Value),
    /// Addressable stack slot.
    Slot {
        addr: Value,
        ty: IrType,
        mutable: bool,
    },
    /// Function parameter held as a value.
    Param(Value),
}

/// Jump targets of one active loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoopTargets {
    pub break_to: BlockId,
    pub continue_to: BlockId,
}

#[derive(Clone, Debug)]
struct Frame {
    ret: IrType,
    loops: Vec<LoopTargets>,
}

#[derive(Clone, Debug, Default)]
pub struct ValueEnv {
    scopes: Vec<FxHashMap<Name, Binding>>,
    frames: Vec<Frame>,
}

impl ValueEnv {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Scopes ─────────────────────────────────────────────────

    pub fn enter_scope(&mut self) {
        self.scopes.push(FxHashMap::default());
    }

    pub fn leave_scope(&mut self) {
        self.scopes.pop();
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Bind `name` in the innermost scope, shadowing any outer binding.
    /// Binding with no open scope opens one.
    pub fn bind(&mut self, name: Name, binding: Binding) {
        if self.scopes.is_empty() {
            self.enter_scope();
        }
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name, binding);
        }
    }

    /// Nearest binding of `name`, innermost scope first.
    pub fn resolve(&self, name: Name) -> Option<&Binding> {
        self.scopes.iter().rev().find_map(|scope| scope.get(&name))
    }

    // ── Function frames ────────────────────────────────────────

    pub fn push_function(&mut self, ret: IrType) {
        self.frames.push(Frame {
            ret,
            loops: Vec::new(),
        });
    }

    pub fn pop_function(&mut self) {
        self.frames.pop();
    }

    pub fn current_return(&self) -> Option<&IrType> {
        self.frames.last().map(|frame| &frame.ret)
    }

    /// Push loop targets onto the current frame. No-op outside a function.
    pub fn push_loop(&mut self, break_to: BlockId, continue_to: BlockId) {
        if let Some(frame) = self.frames.last_mut() {
            frame.loops.push(LoopTargets {
                break_to,
                continue_to,
            });
        }
    }

    pub fn pop_loop(&mut self) {
        if let Some(frame) = self.frames.last_mut() {
            frame.loops.pop();
        }
    }

    pub fn current_break_target(&self) -> Option<BlockId> {
        self.innermost_loop().map(|l| l.break_to)
    }

    pub fn current_continue_target(&self) -> Option<BlockId> {
        self.innermost_loop().map(|l| l.continue_to)
    }

    fn innermost_loop(&self) -> Option<&LoopTargets> {
        self.frames.last().and_then(|frame| frame.loops.last())
    }
}
