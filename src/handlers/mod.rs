// handlers/mod.rs - Two-tier handler layout
//
// Public (no auth, /auth/*) → Protected (JWT auth, /api/*).
// Admin-only routes live in the protected tier behind the role gate.

pub mod protected;
pub mod public;
