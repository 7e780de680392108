//! Signer Quorum & Wallet Selection Engine
//!
//! Keeps a collection of m-of-n multisig wallets consistent while signing
//! devices are attached one at a time, balances and device status arrive
//! asynchronously, and at most one wallet is active:
//! - Wallet collection store with atomic whole-collection loads
//! - Device registry fed by an external device provider
//! - Derived views for the active wallet and candidate devices
//! - Quorum engine, the only path that grows a signer list
//!
//! Rendering, device communication, key derivation and transport are left
//! to collaborators; signers are opaque device identities here.

pub mod audit;
pub mod config;
pub mod device;
pub mod engine;
pub mod selection;
pub mod session;
pub mod source;
pub mod wallet;

mod error;

// Re-export commonly used types
pub use config::{Config, QuorumLimits};
pub use device::{Capability, Device, DeviceId, DeviceRegistry};
pub use engine::QuorumEngine;
pub use error::{Error, Result};
pub use session::Session;
pub use wallet::{Balances, QuorumState, Signer, Wallet, WalletId, WalletStore, WalletView};
