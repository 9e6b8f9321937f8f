//! Derived view of the wallet screen.
//!
//! Nothing here is stored; every field is computed from the current snapshot
//! and the class the user has selected.

use shared::{
    Badge, DashboardResponse, EarnOption, Settings, ShopItemView, StorageMode, WalletData,
};

/// Amounts offered as quick earn buttons
pub const EARN_OPTIONS: [f64; 4] = [0.5, 1.0, 2.0, 5.0];

const BIG_EARNER_THRESHOLD: f64 = 50.0;
const ON_FIRE_STREAK: u32 = 3;
const RICH_THRESHOLD: f64 = 20.0;

#[derive(Clone, Default)]
pub struct DashboardService;

impl DashboardService {
    pub fn new() -> Self {
        Self
    }

    /// Build the dashboard for `requested_class`, falling back to the first
    /// configured class when it is missing or unknown
    pub fn build(
        &self,
        wallet: &WalletData,
        requested_class: Option<&str>,
        storage_mode: StorageMode,
    ) -> DashboardResponse {
        let settings = &wallet.settings;
        let selected_class = select_class(settings, requested_class);
        let class_earned = selected_class
            .as_deref()
            .map(|class_name| wallet.class_earned(class_name))
            .unwrap_or(0.0);
        let progress = earnings_progress(class_earned, settings.max_class_earnings);

        let shop_items = settings
            .shop_items
            .iter()
            .map(|item| ShopItemView {
                item: item.clone(),
                can_afford: wallet.balance >= item.cost,
                formatted_cost: format_amount(&settings.currency_symbol, item.cost),
            })
            .collect();

        let earn_options = EARN_OPTIONS
            .iter()
            .map(|&amount| EarnOption {
                amount,
                label: format!("+{}", format_amount(&settings.currency_symbol, amount)),
                over_limit: class_earned + amount > settings.max_class_earnings,
            })
            .collect();

        DashboardResponse {
            app_title: settings.app_title.clone(),
            student_name: settings.student_name.clone(),
            teacher_name: settings.teacher_name.clone(),
            currency_symbol: settings.currency_symbol.clone(),
            storage_mode,
            balance: wallet.balance,
            formatted_balance: format_amount(&settings.currency_symbol, wallet.balance),
            saved_balance: wallet.saved_balance,
            formatted_saved_balance: format_amount(&settings.currency_symbol, wallet.saved_balance),
            current_streak: wallet.stats.current_streak,
            classes: settings.classes.clone(),
            selected_class,
            class_earned,
            max_class_earnings: settings.max_class_earnings,
            earnings_progress: progress.min(100.0),
            daily_limit_reached: progress >= 100.0,
            estimated_minutes: estimated_minutes(wallet.balance, settings),
            shop_items,
            earn_options,
            badges: badges(wallet),
            goals: settings.goals.clone(),
            total_lifetime_earnings: wallet.stats.total_lifetime_earnings,
            total_lifetime_savings: wallet.stats.total_lifetime_savings,
            history: wallet.history.clone(),
        }
    }
}

/// `"RM 5.00"`
pub fn format_amount(currency_symbol: &str, amount: f64) -> String {
    format!("{} {:.2}", currency_symbol, amount)
}

/// Percentage of the daily class cap, uncapped. A non-positive cap counts as reached.
pub fn earnings_progress(class_earned: f64, max_class_earnings: f64) -> f64 {
    if max_class_earnings <= 0.0 {
        return 100.0;
    }
    class_earned / max_class_earnings * 100.0
}

/// Screen-time minutes the balance buys at the best minutes-per-point rate
pub fn estimated_minutes(balance: f64, settings: &Settings) -> u32 {
    let best_ratio = settings
        .shop_items
        .iter()
        .map(|item| item.minutes_per_point())
        .fold(0.0_f64, f64::max);
    let minutes = (balance * best_ratio).floor();
    if minutes.is_finite() && minutes > 0.0 {
        minutes as u32
    } else {
        0
    }
}

pub fn badges(wallet: &WalletData) -> Vec<Badge> {
    let stats = &wallet.stats;
    vec![
        badge("first_save", "First Save", "🏦", stats.total_lifetime_savings > 0.0),
        badge(
            "big_earner",
            "Big Earner",
            "💰",
            stats.total_lifetime_earnings >= BIG_EARNER_THRESHOLD,
        ),
        badge("on_fire", "On Fire", "🔥", stats.current_streak >= ON_FIRE_STREAK),
        badge("rich", "Rich", "💎", wallet.balance >= RICH_THRESHOLD),
    ]
}

fn badge(id: &str, name: &str, icon: &str, unlocked: bool) -> Badge {
    Badge {
        id: id.to_string(),
        name: name.to_string(),
        icon: icon.to_string(),
        unlocked,
    }
}

fn select_class(settings: &Settings, requested_class: Option<&str>) -> Option<String> {
    match requested_class {
        Some(class_name) if settings.has_class(class_name) => Some(class_name.to_string()),
        _ => settings.classes.first().cloned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use shared::ShopItem;

    fn wallet() -> WalletData {
        WalletData::initial(NaiveDate::from_ymd_opt(2024, 4, 1).unwrap())
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount("RM", 5.0), "RM 5.00");
        assert_eq!(format_amount("$", 0.5), "$ 0.50");
        assert_eq!(format_amount("RM", -1.234), "RM -1.23");
    }

    #[test]
    fn test_progress_and_limit() {
        let mut wallet = wallet();
        wallet.class_earnings.insert("Period 1".to_string(), 2.5);
        let view = DashboardService::new().build(&wallet, Some("Period 1"), StorageMode::Local);
        assert_eq!(view.earnings_progress, 50.0);
        assert!(!view.daily_limit_reached);

        wallet.class_earnings.insert("Period 1".to_string(), 6.0);
        let view = DashboardService::new().build(&wallet, Some("Period 1"), StorageMode::Local);
        assert_eq!(view.earnings_progress, 100.0);
        assert!(view.daily_limit_reached);
    }

    #[test]
    fn test_progress_with_zero_cap() {
        assert_eq!(earnings_progress(0.0, 0.0), 100.0);
    }

    #[test]
    fn test_estimated_minutes_uses_best_ratio() {
        let mut settings = Settings::default();
        // 5/1, 15/3 and 30/5 give 5, 5 and 6 minutes per point
        assert_eq!(estimated_minutes(2.5, &settings), 15);

        settings.shop_items.push(ShopItem {
            id: "4".to_string(),
            cost: 2.0,
            minutes: 25,
            label: "Movie".to_string(),
        });
        assert_eq!(estimated_minutes(1.0, &settings), 12);

        settings.shop_items.clear();
        assert_eq!(estimated_minutes(10.0, &settings), 0);
        assert_eq!(estimated_minutes(-3.0, &Settings::default()), 0);
    }

    #[test]
    fn test_earn_options_flag_over_limit() {
        let mut wallet = wallet();
        wallet.class_earnings.insert("Period 2".to_string(), 4.0);
        let view = DashboardService::new().build(&wallet, Some("Period 2"), StorageMode::Remote);
        let flags: Vec<bool> = view.earn_options.iter().map(|o| o.over_limit).collect();
        assert_eq!(flags, vec![false, false, true, true]);
        assert_eq!(view.earn_options[0].label, "+RM 0.50");
    }

    #[test]
    fn test_unknown_class_falls_back_to_first() {
        let view = DashboardService::new().build(&wallet(), Some("Gym"), StorageMode::Local);
        assert_eq!(view.selected_class.as_deref(), Some("Period 1"));

        let mut empty = wallet();
        empty.settings.classes.clear();
        let view = DashboardService::new().build(&empty, None, StorageMode::Local);
        assert_eq!(view.selected_class, None);
        assert_eq!(view.class_earned, 0.0);
    }

    #[test]
    fn test_shop_affordability() {
        let mut wallet = wallet();
        wallet.balance = 3.0;
        let view = DashboardService::new().build(&wallet, None, StorageMode::Local);
        let affordable: Vec<bool> = view.shop_items.iter().map(|i| i.can_afford).collect();
        assert_eq!(affordable, vec![true, true, false]);
        assert_eq!(view.shop_items[1].formatted_cost, "RM 3.00");
        assert_eq!(view.formatted_balance, "RM 3.00");
    }

    #[test]
    fn test_badges_unlock() {
        let mut wallet = wallet();
        assert!(badges(&wallet).iter().all(|b| !b.unlocked));

        wallet.stats.total_lifetime_savings = 0.5;
        wallet.stats.total_lifetime_earnings = 50.0;
        wallet.stats.current_streak = 3;
        wallet.balance = 20.0;
        let unlocked: Vec<String> = badges(&wallet)
            .into_iter()
            .filter(|b| b.unlocked)
            .map(|b| b.name)
            .collect();
        assert_eq!(unlocked, vec!["First Save", "Big Earner", "On Fire", "Rich"]);

        wallet.stats.current_streak = 2;
        wallet.balance = 19.99;
        let on_fire = badges(&wallet).into_iter().find(|b| b.id == "on_fire").unwrap();
        assert!(!on_fire.unlocked);
    }
}
