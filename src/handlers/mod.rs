// handlers/mod.rs - Handler tiers
//
// Public (no auth) → Protected (bearer auth, owner checks in the services)
pub mod protected;
pub mod public;
