//! Which local names a function body uses as the root of a place.
//!
//! An immutable binding whose address is needed (`&x`, `x.f`, `x[i]`)
//! lives in a slot from the point it is bound, so every use shares one
//! address and the value is copied into memory once.

use rustc_hash::FxHashSet;
use tern_ir::{ExprArena, ExprId, ExprKind, Name, Stmt, TyKind, TypePool};

/// Names rooting a place expression anywhere in `body`.
///
/// Conservative: names are not scope-qualified, so a shadowed binding of
/// the same name is also treated as address-taken.
pub(crate) fn collect_address_taken(
    arena: &ExprArena,
    pool: &TypePool,
    body: ExprId,
) -> FxHashSet<Name> {
    let mut taken = FxHashSet::default();
    let mut work = vec![body];

    while let Some(id) = work.pop() {
        let Some(node) = arena.try_get(id) else {
            continue;
        };
        match node.kind {
            ExprKind::Int(_)
            | ExprKind::Bool(_)
            | ExprKind::Char(_)
            | ExprKind::Str(_)
            | ExprKind::Unit
            | ExprKind::Path(_)
            | ExprKind::Break
            | ExprKind::Continue => {}

            ExprKind::Borrow { operand, .. } => {
                taken.extend(place_root(arena, pool, operand));
                work.push(operand);
            }
            ExprKind::Field { base, .. } => {
                taken.extend(place_root(arena, pool, id));
                work.push(base);
            }
            ExprKind::Index { base, index } => {
                taken.extend(place_root(arena, pool, id));
                work.extend([base, index]);
            }

            ExprKind::Binary { lhs, rhs, .. } => work.extend([lhs, rhs]),
            ExprKind::Assign { target, value } | ExprKind::CompoundAssign { target, value, .. } => {
                work.extend([target, value]);
            }
            ExprKind::While { cond, body } => work.extend([cond, body]),
            ExprKind::Unary { operand, .. }
            | ExprKind::Deref(operand)
            | ExprKind::Cast(operand)
            | ExprKind::Loop { body: operand }
            | ExprKind::Match { scrutinee: operand } => work.push(operand),
            ExprKind::Return(value) => work.extend(value.valid()),
            ExprKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                work.extend([cond, then_branch]);
                work.extend(else_branch.valid());
            }
            ExprKind::Block { stmts, tail, .. } => {
                for stmt in arena.get_stmts(stmts) {
                    match *stmt {
                        Stmt::Let { init, .. } => work.extend(init.valid()),
                        Stmt::Expr(expr) | Stmt::Semi(expr) => work.push(expr),
                        Stmt::Item(_) => {}
                    }
                }
                work.extend(tail.valid());
            }
            ExprKind::Call { callee, args } => {
                work.push(callee);
                work.extend_from_slice(arena.get_expr_list(args));
            }
            ExprKind::MethodCall { receiver, args, .. } => {
                work.push(receiver);
                work.extend_from_slice(arena.get_expr_list(args));
            }
            ExprKind::StructLit { fields } => {
                work.extend(arena.get_field_inits(fields).iter().map(|init| init.value));
            }
            ExprKind::Array(elems) | ExprKind::Tuple(elems) => {
                work.extend_from_slice(arena.get_expr_list(elems));
            }
        }
    }
    taken
}

/// The local a place expression is addressed through, if any. Bases of
/// reference type are read as values and dereferenced, so they root
/// nothing.
fn place_root(arena: &ExprArena, pool: &TypePool, mut id: ExprId) -> Option<Name> {
    loop {
        match *arena.kind(id) {
            ExprKind::Path(names) => {
                return match arena.get_names(names) {
                    [name] => Some(*name),
                    _ => None,
                };
            }
            ExprKind::Field { base, .. } | ExprKind::Index { base, .. } => {
                if matches!(pool.kind(arena.ty(base)), TyKind::Ref { .. }) {
                    return None;
                }
                id = base;
            }
            _ => return None,
        }
    }
}
