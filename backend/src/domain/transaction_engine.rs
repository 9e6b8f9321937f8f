//! Balance rules for the classroom wallet.
//!
//! Every function here is pure: it reads the current [`WalletData`] and returns
//! a [`WalletPatch`] with the fields that change. Nothing is validated here;
//! sufficiency and daily-cap checks happen in the wallet service before a
//! command is dispatched, so a patch can legitimately drive a balance negative.
//!
//! | Type     | balance | savedBalance | other                                   |
//! |----------|---------|--------------|-----------------------------------------|
//! | EARN     | +amount |              | classEarnings[class] += amount, lifetime earnings |
//! | SPEND    | -amount |              |                                         |
//! | DEPOSIT  | -amount | +amount      | lifetime savings, streak                |
//! | WITHDRAW | +amount | -amount      |                                         |

use chrono::NaiveDate;
use shared::{GameStats, Transaction, TransactionType, WalletData, HISTORY_LIMIT};
use std::collections::BTreeMap;

use super::models::{WalletCommand, WalletPatch};

/// Build the history record for an action happening now
pub fn new_transaction(
    kind: TransactionType,
    amount: f64,
    description: &str,
    active_class: Option<&str>,
    now_millis: i64,
) -> Transaction {
    Transaction {
        id: Transaction::generate_id(),
        kind,
        amount,
        description: description.to_string(),
        timestamp: now_millis,
        class_name: active_class.map(str::to_string),
    }
}

/// Compute the partial update for one transaction of the given type
pub fn apply(
    kind: TransactionType,
    amount: f64,
    description: &str,
    active_class: Option<&str>,
    state: &WalletData,
    today: NaiveDate,
    now_millis: i64,
) -> WalletPatch {
    let transaction = new_transaction(kind, amount, description, active_class, now_millis);
    apply_transaction(&transaction, state, today)
}

/// Compute the partial update for an already built transaction record
pub fn apply_transaction(transaction: &Transaction, state: &WalletData, today: NaiveDate) -> WalletPatch {
    let amount = transaction.amount;
    let mut patch = WalletPatch {
        history: Some(prepend_history(&state.history, transaction.clone())),
        ..Default::default()
    };

    match transaction.kind {
        TransactionType::Earn => {
            patch.balance = Some(state.balance + amount);
            if let Some(class_name) = &transaction.class_name {
                let mut class_earnings = state.class_earnings.clone();
                *class_earnings.entry(class_name.clone()).or_insert(0.0) += amount;
                patch.class_earnings = Some(class_earnings);
            }
            patch.stats = Some(GameStats {
                total_lifetime_earnings: state.stats.total_lifetime_earnings + amount,
                ..state.stats.clone()
            });
        }
        TransactionType::Spend => {
            patch.balance = Some(state.balance - amount);
        }
        TransactionType::Deposit => {
            patch.balance = Some(state.balance - amount);
            patch.saved_balance = Some(state.saved_balance + amount);
            patch.stats = Some(GameStats {
                total_lifetime_savings: state.stats.total_lifetime_savings + amount,
                current_streak: next_streak(&state.stats, today),
                last_deposit_date: Some(today),
                ..state.stats.clone()
            });
        }
        TransactionType::Withdraw => {
            patch.saved_balance = Some(state.saved_balance - amount);
            patch.balance = Some(state.balance + amount);
        }
    }

    patch
}

/// Streak after a deposit made on `today`
pub fn next_streak(stats: &GameStats, today: NaiveDate) -> u32 {
    match stats.last_deposit_date {
        Some(last) if last == today => stats.current_streak,
        Some(last) if today.pred_opt() == Some(last) => stats.current_streak + 1,
        _ => 1,
    }
}

/// Zero every class's earnings when the wallet was last active on another day.
///
/// Returns `None` when the wallet is already current.
pub fn daily_reset(state: &WalletData, today: NaiveDate) -> Option<WalletPatch> {
    if state.last_active_date == today {
        return None;
    }

    let mut class_earnings: BTreeMap<String, f64> = state
        .class_earnings
        .keys()
        .map(|class_name| (class_name.clone(), 0.0))
        .collect();
    for class_name in &state.settings.classes {
        class_earnings.entry(class_name.clone()).or_insert(0.0);
    }

    Some(WalletPatch {
        class_earnings: Some(class_earnings),
        last_active_date: Some(today),
        ..Default::default()
    })
}

/// The single entry point for turning a command into a patch
pub fn reduce(state: &WalletData, command: &WalletCommand, today: NaiveDate) -> WalletPatch {
    match command {
        WalletCommand::Record(transaction) => apply_transaction(transaction, state, today),
        WalletCommand::StartClass { class_name } => {
            let mut class_earnings = state.class_earnings.clone();
            class_earnings.insert(class_name.clone(), 0.0);
            WalletPatch {
                class_earnings: Some(class_earnings),
                ..Default::default()
            }
        }
        WalletCommand::ResetDay => daily_reset(state, today).unwrap_or_default(),
        WalletCommand::ReplaceSettings(settings) => WalletPatch {
            settings: Some(settings.clone()),
            ..Default::default()
        },
    }
}

fn prepend_history(history: &[Transaction], transaction: Transaction) -> Vec<Transaction> {
    let mut updated = Vec::with_capacity(HISTORY_LIMIT);
    updated.push(transaction);
    updated.extend(history.iter().take(HISTORY_LIMIT - 1).cloned());
    updated
}
