//! Tern lowering: resolved syntax tree → Tern virtual instruction set.
//!
//! # Architecture
//!
//! ```text
//! ResolvedCrate ──► lower_crate ──► CodegenContext ──► ExprLowerer ──► Module
//!                                    ├─ IrBuilder     (cursor, allocas, peephole)
//!                                    ├─ ValueEnv      (bindings, loop targets)
//!                                    └─ TypeMapper    (TyId → IrType)
//! ```
//!
//! Lowering runs in two phases. The first declares every struct type,
//! const global and function signature, so bodies can refer to items in
//! any order. The second lowers each body into its already declared
//! function.
//!
//! The resolver has already checked the program. Lowering does not report
//! user-facing diagnostics; every [`LowerError`] is fatal for the crate.

mod builder;
mod context;
mod env;
mod error;
mod lower;
mod options;
mod type_mapper;

#[cfg(test)]
mod test_helpers;

pub use builder::{Cursor, IrBuilder};
pub use context::CodegenContext;
pub use env::{Binding, LoopTargets, ValueEnv};
pub use error::{ErrorCategory, LowerError};
pub use lower::ExprLowerer;
pub use options::LowerOptions;
pub use type_mapper::TypeMapper;

use tern_ir::{Item, ResolvedCrate, StringInterner};
use tern_vir::Module;

/// Lower a whole resolved crate into one module.
pub fn lower_crate(
    krate: &ResolvedCrate,
    interner: &StringInterner,
    options: &LowerOptions,
) -> Result<Module, LowerError> {
    let _span = tracing::debug_span!("lower_crate", module = %options.module_name).entered();
    let mut cx = CodegenContext::new(krate, interner, options);

    // Phase 1: declarations.
    for item in &krate.items {
        match item {
            Item::Struct(decl) => {
                cx.map_type(decl.ty)?;
            }
            Item::Const(decl) => {
                cx.declare_const(decl)?;
            }
            Item::Fn(_) | Item::Impl(_) => {}
        }
    }
    let declared = krate
        .functions()
        .map(|decl| Ok((decl, cx.declare_fn(decl)?)))
        .collect::<Result<Vec<_>, LowerError>>()?;

    // Phase 2: bodies.
    for (decl, id) in declared {
        ExprLowerer::new(&mut cx).lower_function(decl, id)?;
    }

    let module = cx.finish();
    tracing::debug!(
        functions = module.all_functions().len(),
        globals = module.all_globals().len(),
        "lowered crate"
    );
    Ok(module)
}
