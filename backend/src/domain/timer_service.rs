//! Screen-time countdown started by shop purchases.
//!
//! The countdown lives only in memory. Restarting the server or buying another
//! item replaces it.

use shared::TimerStatus;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tracing::{debug, info};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimerState {
    pub total_seconds: u32,
    pub seconds_left: u32,
    pub is_active: bool,
}

impl TimerState {
    /// Count down one second. Returns whether the timer is still running.
    pub fn tick(&mut self) -> bool {
        if !self.is_active {
            return false;
        }
        self.seconds_left = self.seconds_left.saturating_sub(1);
        if self.seconds_left == 0 {
            self.is_active = false;
        }
        self.is_active
    }

    pub fn status(&self) -> TimerStatus {
        TimerStatus {
            total_seconds: self.total_seconds,
            seconds_left: self.seconds_left,
            is_active: self.is_active,
            formatted: format_time(self.seconds_left),
        }
    }
}

/// `mm:ss`, minutes are not wrapped at 60
pub fn format_time(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

#[derive(Clone)]
pub struct ScreenTimeTimer {
    state: Arc<Mutex<TimerState>>,
    task: Arc<Mutex<Option<JoinHandle<()>>>>,
    tick_interval: Duration,
}

impl ScreenTimeTimer {
    pub fn new() -> Self {
        Self::with_tick_interval(Duration::from_secs(1))
    }

    /// Timer whose "second" lasts `tick_interval`
    pub fn with_tick_interval(tick_interval: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(TimerState::default())),
            task: Arc::new(Mutex::new(None)),
            tick_interval,
        }
    }

    /// Start counting down `minutes`, replacing any running countdown.
    /// Zero minutes leaves the timer untouched.
    pub async fn start(&self, minutes: u32) -> TimerStatus {
        if minutes == 0 {
            return self.status().await;
        }
        info!("⏱️ Starting screen time countdown: {} minutes", minutes);
        self.start_seconds(minutes.saturating_mul(60)).await
    }

    pub(crate) async fn start_seconds(&self, seconds: u32) -> TimerStatus {
        let mut task = self.task.lock().await;
        if let Some(previous) = task.take() {
            previous.abort();
        }

        let status = {
            let mut state = self.state.lock().await;
            *state = TimerState {
                total_seconds: seconds,
                seconds_left: seconds,
                is_active: seconds > 0,
            };
            state.status()
        };

        if seconds > 0 {
            let state = Arc::clone(&self.state);
            let period = self.tick_interval;
            *task = Some(tokio::spawn(async move {
                let mut ticker = interval_at(Instant::now() + period, period);
                loop {
                    ticker.tick().await;
                    let mut state = state.lock().await;
                    if !state.tick() {
                        debug!("Screen time countdown finished");
                        break;
                    }
                }
            }));
        }

        status
    }

    /// Stop the countdown, keeping the remaining time for display
    pub async fn stop(&self) -> TimerStatus {
        if let Some(handle) = self.task.lock().await.take() {
            handle.abort();
        }
        let mut state = self.state.lock().await;
        if state.is_active {
            info!("⏹️ Screen time countdown stopped with {} seconds left", state.seconds_left);
        }
        state.is_active = false;
        state.status()
    }

    pub async fn status(&self) -> TimerStatus {
        self.state.lock().await.status()
    }
}

impl Default for ScreenTimeTimer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0), "00:00");
        assert_eq!(format_time(59), "00:59");
        assert_eq!(format_time(300), "05:00");
        assert_eq!(format_time(1805), "30:05");
        assert_eq!(format_time(3600), "60:00");
    }

    #[test]
    fn test_tick_counts_down_and_stops() {
        let mut state = TimerState {
            total_seconds: 2,
            seconds_left: 2,
            is_active: true,
        };
        assert!(state.tick());
        assert_eq!(state.seconds_left, 1);
        assert!(!state.tick());
        assert_eq!(state.seconds_left, 0);
        assert!(!state.is_active);
        assert!(!state.tick());
        assert_eq!(state.seconds_left, 0);
    }

    #[tokio::test]
    async fn test_start_sets_full_duration() {
        let timer = ScreenTimeTimer::new();
        let status = timer.start(5).await;
        assert_eq!(status.total_seconds, 300);
        assert_eq!(status.seconds_left, 300);
        assert!(status.is_active);
        assert_eq!(status.formatted, "05:00");
        timer.stop().await;
    }

    #[tokio::test]
    async fn test_zero_minutes_does_nothing() {
        let timer = ScreenTimeTimer::new();
        let status = timer.start(0).await;
        assert!(!status.is_active);
        assert_eq!(status.total_seconds, 0);
    }

    #[tokio::test]
    async fn test_countdown_runs_to_zero() {
        let timer = ScreenTimeTimer::with_tick_interval(Duration::from_millis(5));
        timer.start_seconds(3).await;
        tokio::time::sleep(Duration::from_millis(200)).await;
        let status = timer.status().await;
        assert!(!status.is_active);
        assert_eq!(status.seconds_left, 0);
        assert_eq!(status.formatted, "00:00");
    }

    #[tokio::test]
    async fn test_stop_freezes_remaining_time() {
        let timer = ScreenTimeTimer::with_tick_interval(Duration::from_millis(5));
        timer.start_seconds(10_000).await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        let stopped = timer.stop().await;
        assert!(!stopped.is_active);
        assert!(stopped.seconds_left < 10_000);

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(timer.status().await.seconds_left, stopped.seconds_left);
    }

    #[tokio::test]
    async fn test_restart_replaces_countdown() {
        let timer = ScreenTimeTimer::new();
        timer.start(30).await;
        let status = timer.start(5).await;
        assert_eq!(status.total_seconds, 300);
        assert!(status.is_active);
        timer.stop().await;
    }
}
