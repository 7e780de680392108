//! Derived views over the store and device registry
//!
//! Neither view keeps state of its own; every call reads the current
//! collection and registry.

mod active;
mod candidates;

pub use active::ActiveWalletSelector;
pub use candidates::CandidateSelector;
