//! Stack growth for nested calls.
//!
//! Each Quill call recurses through several evaluator frames. On native
//! targets the stack is extended before a call when less than the red zone
//! remains, so the call depth limit is reached before the thread's stack
//! runs out, whatever size that stack was spawned with.

/// Grow when less than this remains.
#[cfg(not(target_arch = "wasm32"))]
const RED_ZONE: usize = 256 * 1024;

/// Size of each additional stack segment.
#[cfg(not(target_arch = "wasm32"))]
const STACK_PER_GROWTH: usize = 2 * 1024 * 1024;

#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub(crate) fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_GROWTH, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub(crate) fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
