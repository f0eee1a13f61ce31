//! Span and event hooks for the kernel passes.
//!
//! Generation, both evaluators and the oracle report through `trace_span!`
//! and `trace_event!`. With the `tracing` feature the macros forward to
//! `tracing`; otherwise spans become `NoopSpan` and events only evaluate their
//! fields, so kernels carry no `cfg` attributes at the call sites.

/// Opens an info-level span, e.g. `trace_span!("tiled_eval", n = n).entered()`.
#[cfg(feature = "tracing")]
macro_rules! trace_span {
    ($name:expr $(, $($field:tt)*)?) => {
        tracing::info_span!($name $(, $($field)*)?)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_span {
    ($name:expr $(, $($field:tt)*)?) => {
        $crate::trace::NoopSpan
    };
}

/// Records a named measurement such as a tile count or an elapsed time.
#[cfg(feature = "tracing")]
macro_rules! trace_event {
    ($name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        tracing::info!(name: $name, $($key = $value),+)
    };
    ($name:expr) => {
        tracing::info!(name: $name)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_event {
    ($name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        let _ = ($($value,)+);
    };
    ($name:expr) => {};
}

pub(crate) use trace_event;
pub(crate) use trace_span;

/// Placeholder span for builds without `tracing`.
#[cfg(not(feature = "tracing"))]
pub struct NoopSpan;

#[cfg(not(feature = "tracing"))]
impl NoopSpan {
    /// Stands in for `Span::entered`; the guard does nothing on drop.
    #[inline]
    pub fn entered(self) -> Self {
        self
    }
}
