// ── Beans Atoms Layer ──────────────────────────────────────────────────────
// Error types and the provider trait — zero side effects, no I/O.
// Dependency rule: atoms may only depend on std, external pure crates, and
// `engine::types` for the message shapes the trait carries.

pub mod error;
pub mod traits;
