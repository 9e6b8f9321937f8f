//! Wallet actions as the user triggers them.
//!
//! Each action checks the current snapshot the way the wallet screen does
//! (sufficient funds, daily class cap, known class and shop item), turns the
//! action into a [`WalletCommand`], reduces it against that same snapshot and
//! hands the resulting patch to the [`SyncAdapter`]. Nothing serializes the
//! read-check-write sequence, so two concurrent actions can overwrite each
//! other's changes.

use shared::{
    BankResponse, DashboardResponse, EarnRequest, ExportHistoryResponse, ImportHistoryRequest,
    ImportHistoryResponse, PurchaseRequest, PurchaseResponse, Settings, SpendRequest,
    StartClassRequest, TimerStatus, TransactionResponse, TransactionType, WalletData,
};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use super::clock::Clock;
use super::dashboard::{format_amount, DashboardService};
use super::export_service::{parse_amount, ExportError, ExportService};
use super::models::WalletCommand;
use super::timer_service::ScreenTimeTimer;
use super::transaction_engine;
use crate::storage::{SyncAdapter, SyncError};

pub const DEFAULT_EARN_DESCRIPTION: &str = "Class Reward";
pub const DEFAULT_SPEND_DESCRIPTION: &str = "Spent";
pub const DEPOSIT_DESCRIPTION: &str = "Deposit to Bank";
pub const WITHDRAW_DESCRIPTION: &str = "Withdraw from Bank";

/// Which balance a sufficiency check was made against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Account {
    Wallet,
    Bank,
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Account::Wallet => f.write_str("wallet"),
            Account::Bank => f.write_str("bank"),
        }
    }
}

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("Amount must be a positive number, got {0}")]
    InvalidAmount(f64),

    #[error("Insufficient funds in {0}.")]
    InsufficientFunds(Account),

    #[error("Daily limit reached for {class_name}: {earned:.2} of {limit:.2} already earned")]
    ClassLimitReached {
        class_name: String,
        earned: f64,
        limit: f64,
    },

    #[error("Unknown class: {0}")]
    UnknownClass(String),

    #[error("No classes are configured")]
    NoClasses,

    #[error("Unknown shop item: {0}")]
    UnknownShopItem(String),

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BankAction {
    Deposit,
    Withdraw,
}

/// Result of a bank action. Unparseable or non-positive amounts are ignored
/// without an error, the same as an empty input box.
#[derive(Debug, Clone, PartialEq)]
pub enum BankOutcome {
    Applied(WalletData),
    Ignored,
}

#[derive(Clone)]
pub struct WalletService {
    sync: Arc<SyncAdapter>,
    timer: ScreenTimeTimer,
    clock: Arc<dyn Clock>,
    dashboard_service: DashboardService,
    export_service: ExportService,
}

impl WalletService {
    pub fn new(sync: Arc<SyncAdapter>, timer: ScreenTimeTimer) -> Self {
        let clock = Arc::clone(sync.clock());
        Self {
            sync,
            timer,
            clock,
            dashboard_service: DashboardService::new(),
            export_service: ExportService::new(),
        }
    }

    pub fn sync_adapter(&self) -> &Arc<SyncAdapter> {
        &self.sync
    }

    /// Current wallet snapshot
    pub async fn wallet(&self) -> Result<WalletData, WalletError> {
        Ok(self.sync.snapshot().await?)
    }

    /// Award points in a class period, subject to the class's daily cap
    pub async fn earn(&self, request: EarnRequest) -> Result<TransactionResponse, WalletError> {
        info!("🪙 EARN: {:?}", request);
        validate_amount(request.amount)?;

        let wallet = self.sync.snapshot().await?;
        let class_name = resolve_class(&wallet.settings, request.class_name.as_deref())?;

        let earned = wallet.class_earned(&class_name);
        let limit = wallet.settings.max_class_earnings;
        if earned + request.amount > limit {
            info!("🚫 EARN: {} has reached its daily limit", class_name);
            return Err(WalletError::ClassLimitReached {
                class_name,
                earned,
                limit,
            });
        }

        let description = non_empty(request.description.as_deref(), DEFAULT_EARN_DESCRIPTION);
        let success_message = format!(
            "Added {} to {}",
            format_amount(&wallet.settings.currency_symbol, request.amount),
            class_name
        );
        self.record(
            &wallet,
            TransactionType::Earn,
            request.amount,
            &description,
            Some(class_name.as_str()),
            success_message,
        )
        .await
    }

    /// Spend points directly
    pub async fn spend(&self, request: SpendRequest) -> Result<TransactionResponse, WalletError> {
        info!("💸 SPEND: {:?}", request);
        validate_amount(request.amount)?;

        let wallet = self.sync.snapshot().await?;
        let class_name = active_class(&wallet.settings, request.class_name.as_deref())?;
        if wallet.balance < request.amount {
            return Err(WalletError::InsufficientFunds(Account::Wallet));
        }

        let description = non_empty(Some(request.description.as_str()), DEFAULT_SPEND_DESCRIPTION);
        let success_message = format!(
            "Spent {}",
            format_amount(&wallet.settings.currency_symbol, request.amount)
        );
        self.record(
            &wallet,
            TransactionType::Spend,
            request.amount,
            &description,
            class_name.as_deref(),
            success_message,
        )
        .await
    }

    /// Buy a shop item and start its screen-time countdown
    pub async fn purchase(&self, request: PurchaseRequest) -> Result<PurchaseResponse, WalletError> {
        info!("🛒 PURCHASE: item {}", request.item_id);

        let wallet = self.sync.snapshot().await?;
        let item = wallet
            .settings
            .find_shop_item(&request.item_id)
            .cloned()
            .ok_or_else(|| WalletError::UnknownShopItem(request.item_id.clone()))?;
        let class_name = active_class(&wallet.settings, request.class_name.as_deref())?;

        if wallet.balance < item.cost {
            return Err(WalletError::InsufficientFunds(Account::Wallet));
        }

        let description = format!("Purchased {}m Screen Time", item.minutes);
        let transaction = transaction_engine::new_transaction(
            TransactionType::Spend,
            item.cost,
            &description,
            class_name.as_deref(),
            self.clock.now_millis(),
        );
        let updated = self
            .apply_command(&wallet, WalletCommand::Record(transaction.clone()))
            .await?;
        let timer = self.timer.start(item.minutes).await;

        info!("✅ PURCHASE: {} bought, new balance {:.2}", item.label, updated.balance);
        Ok(PurchaseResponse {
            transaction,
            new_balance: updated.balance,
            timer,
        })
    }

    /// Move points between the wallet and the savings bank.
    ///
    /// `raw_amount` is the text the user typed; only its leading number is
    /// read.
    pub async fn bank(
        &self,
        action: BankAction,
        raw_amount: &str,
        class_name: Option<&str>,
    ) -> Result<BankOutcome, WalletError> {
        let amount = match parse_amount(raw_amount) {
            Some(amount) if amount > 0.0 => amount,
            _ => {
                info!("🏦 BANK: ignoring amount {:?}", raw_amount);
                return Ok(BankOutcome::Ignored);
            }
        };

        let wallet = self.sync.snapshot().await?;
        let class_name = active_class(&wallet.settings, class_name)?;
        let (kind, description) = match action {
            BankAction::Deposit => {
                if wallet.balance < amount {
                    return Err(WalletError::InsufficientFunds(Account::Wallet));
                }
                (TransactionType::Deposit, DEPOSIT_DESCRIPTION)
            }
            BankAction::Withdraw => {
                if wallet.saved_balance < amount {
                    return Err(WalletError::InsufficientFunds(Account::Bank));
                }
                (TransactionType::Withdraw, WITHDRAW_DESCRIPTION)
            }
        };

        info!("🏦 BANK: {} {:.2}", kind, amount);
        let transaction = transaction_engine::new_transaction(
            kind,
            amount,
            description,
            class_name.as_deref(),
            self.clock.now_millis(),
        );
        let updated = self
            .apply_command(&wallet, WalletCommand::Record(transaction))
            .await?;
        Ok(BankOutcome::Applied(updated))
    }

    /// Convenience wrapper returning the API view of a bank action
    pub async fn bank_response(
        &self,
        action: BankAction,
        raw_amount: &str,
        class_name: Option<&str>,
    ) -> Result<BankResponse, WalletError> {
        let (applied, wallet) = match self.bank(action, raw_amount, class_name).await? {
            BankOutcome::Applied(wallet) => (true, wallet),
            BankOutcome::Ignored => (false, self.sync.current().await),
        };
        Ok(BankResponse {
            applied,
            balance: wallet.balance,
            saved_balance: wallet.saved_balance,
            current_streak: wallet.stats.current_streak,
        })
    }

    /// Clear today's earnings for one class period
    pub async fn start_class(&self, request: StartClassRequest) -> Result<WalletData, WalletError> {
        info!("🔔 START CLASS: {}", request.class_name);
        let wallet = self.sync.snapshot().await?;
        if !wallet.settings.has_class(&request.class_name) {
            return Err(WalletError::UnknownClass(request.class_name));
        }
        self.apply_command(
            &wallet,
            WalletCommand::StartClass {
                class_name: request.class_name,
            },
        )
        .await
    }

    pub async fn settings(&self) -> Result<Settings, WalletError> {
        Ok(self.sync.snapshot().await?.settings)
    }

    /// Replace the settings wholesale
    pub async fn update_settings(&self, settings: Settings) -> Result<WalletData, WalletError> {
        info!("⚙️ SETTINGS: updating settings for {}", settings.student_name);
        validate_settings(&settings)?;
        let wallet = self.sync.snapshot().await?;
        self.apply_command(&wallet, WalletCommand::ReplaceSettings(settings))
            .await
    }

    /// Start over with the initial wallet
    pub async fn reset(&self) -> Result<WalletData, WalletError> {
        info!("🔄 RESET: resetting wallet");
        Ok(self.sync.reset().await?)
    }

    /// Record every EARN row of pasted CSV text, one update per row
    pub async fn import_history(
        &self,
        request: ImportHistoryRequest,
    ) -> Result<ImportHistoryResponse, WalletError> {
        let rows = self.export_service.parse_import(&request.text);
        let settings = self.sync.snapshot().await?.settings;
        let class_name = resolve_class(&settings, request.class_name.as_deref())?;

        let mut imported_count = 0;
        for row in rows {
            let wallet = self.sync.snapshot().await?;
            let transaction = transaction_engine::new_transaction(
                TransactionType::Earn,
                row.amount,
                &row.description,
                Some(class_name.as_str()),
                self.clock.now_millis(),
            );
            self.apply_command(&wallet, WalletCommand::Record(transaction))
                .await?;
            imported_count += 1;
        }

        info!("✅ IMPORT: Imported {} earning records into {}", imported_count, class_name);
        Ok(ImportHistoryResponse {
            imported_count,
            message: format!("Imported {} earning records.", imported_count),
        })
    }

    pub async fn export_history(&self) -> Result<ExportHistoryResponse, WalletError> {
        let wallet = self.sync.snapshot().await?;
        Ok(self.export_service.export_history_csv(&wallet.history)?)
    }

    pub async fn dashboard(&self, class_name: Option<&str>) -> Result<DashboardResponse, WalletError> {
        let wallet = self.sync.snapshot().await?;
        Ok(self
            .dashboard_service
            .build(&wallet, class_name, self.sync.mode()))
    }

    pub async fn timer_status(&self) -> TimerStatus {
        self.timer.status().await
    }

    pub async fn stop_timer(&self) -> TimerStatus {
        self.timer.stop().await
    }

    async fn record(
        &self,
        wallet: &WalletData,
        kind: TransactionType,
        amount: f64,
        description: &str,
        class_name: Option<&str>,
        success_message: String,
    ) -> Result<TransactionResponse, WalletError> {
        let transaction = transaction_engine::new_transaction(
            kind,
            amount,
            description,
            class_name,
            self.clock.now_millis(),
        );
        let updated = self
            .apply_command(wallet, WalletCommand::Record(transaction.clone()))
            .await?;

        info!("✅ {}: {}", kind, success_message);
        Ok(TransactionResponse {
            transaction,
            new_balance: updated.balance,
            new_saved_balance: updated.saved_balance,
            success_message,
        })
    }

    /// Reduce `command` against the snapshot it was checked on and persist
    async fn apply_command(
        &self,
        wallet: &WalletData,
        command: WalletCommand,
    ) -> Result<WalletData, WalletError> {
        let patch = transaction_engine::reduce(wallet, &command, self.clock.today());
        tracing::debug!(command = command.name(), "Dispatching wallet command");
        Ok(self.sync.update(patch).await?)
    }
}

fn validate_amount(amount: f64) -> Result<(), WalletError> {
    if amount.is_finite() && amount > 0.0 {
        Ok(())
    } else {
        Err(WalletError::InvalidAmount(amount))
    }
}

fn validate_settings(settings: &Settings) -> Result<(), WalletError> {
    if !settings.max_class_earnings.is_finite() || settings.max_class_earnings < 0.0 {
        return Err(WalletError::InvalidSettings(
            "maxClassEarnings must be zero or more".to_string(),
        ));
    }
    if let Some(item) = settings
        .shop_items
        .iter()
        .find(|item| !item.cost.is_finite() || item.cost <= 0.0)
    {
        return Err(WalletError::InvalidSettings(format!(
            "shop item {} must cost more than zero",
            item.id
        )));
    }
    Ok(())
}

/// The requested class if configured, otherwise the first configured class
fn resolve_class(settings: &Settings, requested: Option<&str>) -> Result<String, WalletError> {
    match requested.map(str::trim).filter(|name| !name.is_empty()) {
        Some(class_name) if settings.has_class(class_name) => Ok(class_name.to_string()),
        Some(class_name) => Err(WalletError::UnknownClass(class_name.to_string())),
        None => settings.classes.first().cloned().ok_or(WalletError::NoClasses),
    }
}

/// Class a non-earning transaction is recorded under. Unlike earning, having
/// no configured classes is fine and leaves the transaction unclassed.
fn active_class(settings: &Settings, requested: Option<&str>) -> Result<Option<String>, WalletError> {
    match resolve_class(settings, requested) {
        Ok(class_name) => Ok(Some(class_name)),
        Err(WalletError::NoClasses) => Ok(None),
        Err(e) => Err(e),
    }
}

fn non_empty(value: Option<&str>, default: &str) -> String {
    match value.map(str::trim) {
        Some(value) if !value.is_empty() => value.to_string(),
        _ => default.to_string(),
    }
}
