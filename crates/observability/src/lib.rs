//! Tracing, logging, metrics (shared setup).
//!
//! The audit service emits on two dedicated targets: `security` for
//! sensitive-action notices and `audit` for swallowed logging failures.
//! Operators can raise or silence either stream via `RUST_LOG` (e.g.
//! `RUST_LOG=info,security=warn,audit=error`).

/// Initialize process-wide observability (tracing/logging).
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init();
}

/// Tracing configuration (filters, layers).
pub mod tracing;
