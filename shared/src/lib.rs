use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Version written into every wallet document by this release.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Maximum number of transactions kept in the wallet history.
pub const HISTORY_LIMIT: usize = 50;

/// Kind of balance-affecting action recorded in the history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    /// Points awarded during a class period
    Earn,
    /// Points spent (screen time purchases)
    Spend,
    /// Points moved from the wallet into the savings bank
    Deposit,
    /// Points moved from the savings bank back into the wallet
    Withdraw,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Earn => "EARN",
            TransactionType::Spend => "SPEND",
            TransactionType::Deposit => "DEPOSIT",
            TransactionType::Withdraw => "WITHDRAW",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParseTransactionTypeError(pub String);

impl fmt::Display for ParseTransactionTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown transaction type: {}", self.0)
    }
}

impl std::error::Error for ParseTransactionTypeError {}

impl FromStr for TransactionType {
    type Err = ParseTransactionTypeError;

    /// Case-insensitive, surrounding whitespace ignored
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "EARN" => Ok(TransactionType::Earn),
            "SPEND" => Ok(TransactionType::Spend),
            "DEPOSIT" => Ok(TransactionType::Deposit),
            "WITHDRAW" => Ok(TransactionType::Withdraw),
            _ => Err(ParseTransactionTypeError(s.trim().to_string())),
        }
    }
}

/// A single immutable history entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub amount: f64,
    pub description: String,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    /// Class period the action happened in, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
}

impl Transaction {
    /// Generate a random transaction ID
    pub fn generate_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// A screen-time reward that can be bought in the shop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopItem {
    pub id: String,
    pub cost: f64,
    pub minutes: u32,
    pub label: String,
}

impl ShopItem {
    /// Minutes of screen time per point spent
    pub fn minutes_per_point(&self) -> f64 {
        if self.cost > 0.0 {
            self.minutes as f64 / self.cost
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStats {
    pub total_lifetime_earnings: f64,
    pub total_lifetime_savings: f64,
    /// Consecutive calendar days with at least one deposit
    pub current_streak: u32,
    pub last_deposit_date: Option<NaiveDate>,
}

impl Default for GameStats {
    fn default() -> Self {
        Self {
            total_lifetime_earnings: 0.0,
            total_lifetime_savings: 0.0,
            current_streak: 0,
            last_deposit_date: None,
        }
    }
}

/// Teacher-editable configuration stored inside the wallet document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub app_title: String,
    pub teacher_name: String,
    pub student_name: String,
    pub currency_symbol: String,
    /// Cap on what one class period can earn per day
    pub max_class_earnings: f64,
    pub shop_items: Vec<ShopItem>,
    pub goals: Vec<String>,
    pub classes: Vec<String>,
}

impl Settings {
    pub fn default_classes() -> Vec<String> {
        (1..=4).map(|n| format!("Period {}", n)).collect()
    }

    pub fn find_shop_item(&self, item_id: &str) -> Option<&ShopItem> {
        self.shop_items.iter().find(|item| item.id == item_id)
    }

    pub fn has_class(&self, class_name: &str) -> bool {
        self.classes.iter().any(|c| c == class_name)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app_title: "Classroom Wallet".to_string(),
            teacher_name: "Teacher".to_string(),
            student_name: "Student".to_string(),
            currency_symbol: "RM".to_string(),
            max_class_earnings: 5.0,
            shop_items: vec![
                ShopItem {
                    id: "1".to_string(),
                    cost: 1.0,
                    minutes: 5,
                    label: "Quick Break".to_string(),
                },
                ShopItem {
                    id: "2".to_string(),
                    cost: 3.0,
                    minutes: 15,
                    label: "Short Session".to_string(),
                },
                ShopItem {
                    id: "3".to_string(),
                    cost: 5.0,
                    minutes: 30,
                    label: "Full Period".to_string(),
                },
            ],
            goals: vec![
                "Complete homework on time".to_string(),
                "Help a classmate".to_string(),
                "Keep desk tidy".to_string(),
            ],
            classes: Self::default_classes(),
        }
    }
}

/// The whole persisted wallet document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletData {
    #[serde(default)]
    pub schema_version: u32,
    /// Spendable points
    pub balance: f64,
    /// Points banked in savings
    pub saved_balance: f64,
    /// Earned-this-period amount per class name
    pub class_earnings: BTreeMap<String, f64>,
    /// Day the class earnings were last reset for
    pub last_active_date: NaiveDate,
    /// Newest first, at most `HISTORY_LIMIT` entries
    pub history: Vec<Transaction>,
    pub stats: GameStats,
    pub settings: Settings,
}

impl WalletData {
    /// Fresh wallet as created on first run or after a reset
    pub fn initial(today: NaiveDate) -> Self {
        let settings = Settings::default();
        let class_earnings = settings
            .classes
            .iter()
            .map(|class| (class.clone(), 0.0))
            .collect();

        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            balance: 0.0,
            saved_balance: 0.0,
            class_earnings,
            last_active_date: today,
            history: Vec::new(),
            stats: GameStats::default(),
            settings,
        }
    }

    /// Amount earned today in the given class (0 when the class has no entry)
    pub fn class_earned(&self, class_name: &str) -> f64 {
        self.class_earnings.get(class_name).copied().unwrap_or(0.0)
    }
}

/// Where the wallet document currently lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageMode {
    /// External document store
    Remote,
    /// Local file fallback ("demo mode")
    Local,
}

/// Message pushed to wallet subscribers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum WalletEvent {
    /// A new full snapshot of the wallet document
    Snapshot(WalletData),
    /// A write could not be persisted; the message is meant for the user
    SaveFailed { message: String },
}

/// Request for awarding points in a class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarnRequest {
    pub amount: f64,
    /// Defaults to "Class Reward"
    pub description: Option<String>,
    /// Defaults to the first configured class
    pub class_name: Option<String>,
}

/// Request for spending points directly
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendRequest {
    pub amount: f64,
    pub description: String,
    /// Class the spend is recorded under, defaults to the first configured class
    #[serde(default)]
    pub class_name: Option<String>,
}

/// Request for buying a shop item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseRequest {
    pub item_id: String,
    #[serde(default)]
    pub class_name: Option<String>,
}

/// Response after buying a shop item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseResponse {
    pub transaction: Transaction,
    pub new_balance: f64,
    pub timer: TimerStatus,
}

/// Response after recording a transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionResponse {
    pub transaction: Transaction,
    pub new_balance: f64,
    pub new_saved_balance: f64,
    pub success_message: String,
}

/// Bank deposit/withdraw request; the amount is the raw text the user typed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankRequest {
    pub amount: String,
    #[serde(default)]
    pub class_name: Option<String>,
}

/// Response after a bank action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankResponse {
    /// False when the amount could not be parsed and nothing happened
    pub applied: bool,
    pub balance: f64,
    pub saved_balance: f64,
    pub current_streak: u32,
}

/// Request for starting a class (clears its earnings for the day)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartClassRequest {
    pub class_name: String,
}

/// Request for importing pasted CSV history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportHistoryRequest {
    pub text: String,
    pub class_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportHistoryResponse {
    pub imported_count: usize,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportHistoryResponse {
    pub csv_content: String,
    pub filename: String,
    pub transaction_count: usize,
}

/// State of the screen-time countdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerStatus {
    pub total_seconds: u32,
    pub seconds_left: u32,
    pub is_active: bool,
    /// `mm:ss`
    pub formatted: String,
}

/// Shop entry as shown on the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopItemView {
    #[serde(flatten)]
    pub item: ShopItem,
    pub can_afford: bool,
    pub formatted_cost: String,
}

/// One of the quick earn buttons
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarnOption {
    pub amount: f64,
    pub label: String,
    pub over_limit: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Badge {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub unlocked: bool,
}

/// Everything the wallet screen displays, derived from the current snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardResponse {
    pub app_title: String,
    pub student_name: String,
    pub teacher_name: String,
    pub currency_symbol: String,
    pub storage_mode: StorageMode,
    pub balance: f64,
    pub formatted_balance: String,
    pub saved_balance: f64,
    pub formatted_saved_balance: String,
    pub current_streak: u32,
    pub classes: Vec<String>,
    pub selected_class: Option<String>,
    pub class_earned: f64,
    pub max_class_earnings: f64,
    /// Percentage of the daily class cap, capped at 100 for display
    pub earnings_progress: f64,
    pub daily_limit_reached: bool,
    pub estimated_minutes: u32,
    pub shop_items: Vec<ShopItemView>,
    pub earn_options: Vec<EarnOption>,
    pub badges: Vec<Badge>,
    pub goals: Vec<String>,
    pub total_lifetime_earnings: f64,
    pub total_lifetime_savings: f64,
    pub history: Vec<Transaction>,
}
