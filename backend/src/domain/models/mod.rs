//! Domain-level types that never leave the backend.
//!
//! The persisted document itself (`WalletData`) lives in the `shared` crate;
//! these are the messages the domain uses to change it.

pub mod command;
pub mod patch;

pub use command::WalletCommand;
pub use patch::WalletPatch;
