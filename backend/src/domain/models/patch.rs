//! Partial update of a wallet document.
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use shared::{GameStats, Settings, Transaction, WalletData};
use std::collections::BTreeMap;

/// The fields a command changes. Absent fields are left untouched.
///
/// Serializes to a camelCase JSON object holding only the present fields, which
/// is the form merged into the stored document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_balance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_earnings: Option<BTreeMap<String, f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_active_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<Transaction>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<GameStats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Settings>,
}

impl WalletPatch {
    pub fn is_empty(&self) -> bool {
        self == &WalletPatch::default()
    }

    /// Merge the present fields into a full wallet
    pub fn apply_to(&self, wallet: &mut WalletData) {
        if let Some(balance) = self.balance {
            wallet.balance = balance;
        }
        if let Some(saved_balance) = self.saved_balance {
            wallet.saved_balance = saved_balance;
        }
        if let Some(class_earnings) = &self.class_earnings {
            wallet.class_earnings = class_earnings.clone();
        }
        if let Some(last_active_date) = self.last_active_date {
            wallet.last_active_date = last_active_date;
        }
        if let Some(history) = &self.history {
            wallet.history = history.clone();
        }
        if let Some(stats) = &self.stats {
            wallet.stats = stats.clone();
        }
        if let Some(settings) = &self.settings {
            wallet.settings = settings.clone();
        }
    }

    /// Top-level document fields to merge into the stored record
    pub fn to_fields(&self) -> Result<Map<String, Value>, serde_json::Error> {
        match serde_json::to_value(self)? {
            Value::Object(fields) => Ok(fields),
            _ => Ok(Map::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 6).unwrap()
    }

    #[test]
    fn test_empty_patch_changes_nothing() {
        let mut wallet = WalletData::initial(today());
        let before = wallet.clone();
        let patch = WalletPatch::default();
        assert!(patch.is_empty());
        patch.apply_to(&mut wallet);
        assert_eq!(wallet, before);
        assert!(patch.to_fields().unwrap().is_empty());
    }

    #[test]
    fn test_apply_only_present_fields() {
        let mut wallet = WalletData::initial(today());
        wallet.saved_balance = 4.0;
        let patch = WalletPatch {
            balance: Some(7.5),
            ..Default::default()
        };
        patch.apply_to(&mut wallet);
        assert_eq!(wallet.balance, 7.5);
        assert_eq!(wallet.saved_balance, 4.0);
    }

    #[test]
    fn test_fields_use_document_names() {
        let patch = WalletPatch {
            saved_balance: Some(2.0),
            last_active_date: Some(today()),
            ..Default::default()
        };
        let fields = patch.to_fields().unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields["savedBalance"], 2.0);
        assert_eq!(fields["lastActiveDate"], "2024-05-06");
    }
}
