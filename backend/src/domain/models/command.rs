//! Commands accepted by the wallet reducer.
use shared::{Settings, Transaction};

/// One intended change to the wallet. Each variant carries only what it needs.
#[derive(Debug, Clone, PartialEq)]
pub enum WalletCommand {
    /// Apply a balance-affecting transaction and add it to the history
    Record(Transaction),
    /// Clear today's earnings for a single class period
    StartClass { class_name: String },
    /// Zero all class earnings if the wallet was last active on another day
    ResetDay,
    /// Replace the settings sub-object wholesale
    ReplaceSettings(Settings),
}

impl WalletCommand {
    /// Short name for logging
    pub fn name(&self) -> &'static str {
        match self {
            WalletCommand::Record(_) => "record",
            WalletCommand::StartClass { .. } => "start_class",
            WalletCommand::ResetDay => "reset_day",
            WalletCommand::ReplaceSettings(_) => "replace_settings",
        }
    }
}
