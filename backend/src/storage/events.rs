//! Typed in-process broadcast of wallet events.
//!
//! Every published snapshot and save-failure alert goes through one
//! [`tokio::sync::broadcast`] channel. Receivers that fall behind skip to the
//! newest message.

use shared::{WalletData, WalletEvent};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// If a subscriber falls behind by more than this many messages it receives
/// [`broadcast::error::RecvError::Lagged`] and skips ahead.
const EVENT_CAPACITY: usize = 64;

#[derive(Clone, Debug)]
pub struct WalletEvents {
    sender: broadcast::Sender<WalletEvent>,
}

impl WalletEvents {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CAPACITY);
        Self { sender }
    }

    /// Returns the number of receivers that got the snapshot
    pub fn publish_snapshot(&self, wallet: WalletData) -> usize {
        self.sender.send(WalletEvent::Snapshot(wallet)).unwrap_or(0)
    }

    pub fn publish_alert(&self, message: &str) -> usize {
        self.sender
            .send(WalletEvent::SaveFailed {
                message: message.to_string(),
            })
            .unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WalletEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for WalletEvents {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle for a callback subscription. Delivery stops on
/// [`Subscription::unsubscribe`] or when the handle is dropped.
#[derive(Debug)]
pub struct Subscription {
    handle: JoinHandle<()>,
}

impl Subscription {
    pub(crate) fn new(handle: JoinHandle<()>) -> Self {
        Self { handle }
    }

    pub fn unsubscribe(self) {
        drop(self);
    }

    pub fn is_active(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[tokio::test]
    async fn test_publish_reaches_every_receiver() {
        let events = WalletEvents::new();
        let mut first = events.subscribe();
        let mut second = events.subscribe();
        assert_eq!(events.subscriber_count(), 2);

        let wallet = WalletData::initial(NaiveDate::from_ymd_opt(2024, 1, 8).unwrap());
        assert_eq!(events.publish_snapshot(wallet.clone()), 2);

        assert_eq!(first.recv().await.unwrap(), WalletEvent::Snapshot(wallet.clone()));
        assert_eq!(second.recv().await.unwrap(), WalletEvent::Snapshot(wallet));
    }

    #[tokio::test]
    async fn test_publish_without_receivers() {
        let events = WalletEvents::new();
        assert_eq!(events.publish_alert("offline"), 0);
    }

    #[tokio::test]
    async fn test_alert_event() {
        let events = WalletEvents::new();
        let mut receiver = events.subscribe();
        events.publish_alert("offline");
        assert_eq!(
            receiver.recv().await.unwrap(),
            WalletEvent::SaveFailed {
                message: "offline".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_dropping_subscription_stops_task() {
        let handle = tokio::spawn(async {
            tokio::time::sleep(std::time::Duration::from_secs(60)).await;
        });
        let subscription = Subscription::new(handle);
        assert!(subscription.is_active());
        subscription.unsubscribe();
    }
}
