//! Stack growth guard for recursive tree walks.
//!
//! The expression emitter recurses once per nested expression, so a
//! generated source file with thousands of nested blocks or a very long
//! `a + b + c + ...` chain would otherwise overflow the native stack.
//! Wrapping each recursive step in [`ensure_sufficient_stack`] moves the
//! walk onto a freshly allocated segment whenever the remaining stack
//! drops below [`MIN_REMAINING`].
//!
//! On `wasm32` the guard is a plain call.

/// Remaining stack below which a new segment is allocated.
pub const MIN_REMAINING: usize = 128 * 1024;

/// Size of each newly allocated segment.
pub const SEGMENT_SIZE: usize = 2 * 1024 * 1024;

/// Run `f`, first growing the stack if less than [`MIN_REMAINING`] is left.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(MIN_REMAINING, SEGMENT_SIZE, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
