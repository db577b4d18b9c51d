pub mod controller;
pub mod elite;

pub use controller::{converged, AdaptiveConfig, AdaptiveController};
pub use elite::{canonical_signature, EliteEntry, EliteRoster};
