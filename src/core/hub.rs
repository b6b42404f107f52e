use crate::core::status::StatusInfo;
use tokio::sync::{broadcast, watch};

/// Capacity of the completion broadcast. Completions are rare (one per
/// successful upload) so a small buffer is plenty.
const COMPLETION_CHANNEL_CAPACITY: usize = 16;

/// Process-wide, replay-latest broadcast of the most recent [`StatusInfo`],
/// plus a separate one-shot-per-occurrence completion signal.
///
/// The hub models "the most recent operation's status", not status per
/// operation: concurrent unrelated operations interleave arbitrarily on the
/// single channel. It is written to only by the operation pipelines in the
/// user service and is never reset except by publishing a new value, so it
/// outlives any individual subscriber.
///
/// The completion signal stays a separate channel on purpose: status
/// subscribers want every tick, completion subscribers only want the
/// "something changed elsewhere, refetch" trigger.
#[derive(Debug)]
pub struct StatusHub {
    current: watch::Sender<StatusInfo>,
    completions: broadcast::Sender<StatusInfo>,
}

impl StatusHub {
    pub fn new() -> Self {
        let (current, _) = watch::channel(StatusInfo::baseline());
        let (completions, _) = broadcast::channel(COMPLETION_CHANNEL_CAPACITY);
        Self {
            current,
            completions,
        }
    }

    /// Replace the current status. Subscribers observe updates in publish
    /// order; the previous value is discarded (no history is retained).
    pub fn publish(&self, status: StatusInfo) {
        // send_replace never fails, even with zero receivers.
        self.current.send_replace(status);
    }

    /// A clone of the most recently published status.
    pub fn latest(&self) -> StatusInfo {
        self.current.borrow().clone()
    }

    /// Subscribe to status updates. The receiver immediately observes the
    /// current value (replay-latest): late subscribers are not blind to
    /// state established before they arrived.
    pub fn subscribe(&self) -> watch::Receiver<StatusInfo> {
        let mut rx = self.current.subscribe();
        // A fresh receiver considers the current value already seen;
        // mark it changed so the first `changed().await` yields it.
        rx.mark_changed();
        rx
    }

    /// Announce a successfully completed upload. Dropped silently when
    /// nobody is listening; the signal is a refetch hint, not a queue.
    pub fn signal_completion(&self, status: StatusInfo) {
        let _ = self.completions.send(status);
    }

    /// Subscribe to the completion signal. Fired exactly once per
    /// successful upload terminal event, never for failures.
    pub fn completions(&self) -> broadcast::Receiver<StatusInfo> {
        self.completions.subscribe()
    }
}

impl Default for StatusHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::status::code;

    #[tokio::test]
    async fn test_new_hub_holds_baseline() {
        let hub = StatusHub::new();
        let latest = hub.latest();
        assert_eq!(latest.status, code::OK);
        assert_eq!(latest.progress, Some(0));
        assert!(latest.messages.is_empty());
    }

    #[tokio::test]
    async fn test_late_subscriber_sees_latest_value() {
        let hub = StatusHub::new();
        hub.publish(StatusInfo::internal_server_error("boom"));

        let mut rx = hub.subscribe();
        rx.changed().await.expect("replayed value should be pending");
        assert_eq!(rx.borrow().status, code::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_subscribing_twice_replays_same_value_twice() {
        let hub = StatusHub::new();
        hub.publish(StatusInfo::success());

        let first = hub.subscribe().borrow().clone();
        let second = hub.subscribe().borrow().clone();
        assert_eq!(first, second);
        assert_eq!(first.messages, vec!["Success".to_string()]);
    }

    #[tokio::test]
    async fn test_publish_supersedes_previous_value() {
        let hub = StatusHub::new();
        hub.publish(StatusInfo::internal_server_error("first"));
        hub.publish(StatusInfo::success());
        assert_eq!(hub.latest().status, code::OK);
    }

    #[tokio::test]
    async fn test_subscribers_observe_updates_in_order() {
        let hub = StatusHub::new();
        let mut rx = hub.subscribe();
        rx.changed().await.expect("baseline replay");

        hub.publish(StatusInfo::success());
        rx.changed().await.expect("update should arrive");
        assert_eq!(rx.borrow().status, code::OK);
        assert_eq!(rx.borrow().messages, vec!["Success".to_string()]);
    }

    #[tokio::test]
    async fn test_completion_signal_reaches_all_subscribers() {
        let hub = StatusHub::new();
        let mut a = hub.completions();
        let mut b = hub.completions();

        hub.signal_completion(StatusInfo::success());

        assert_eq!(a.recv().await.expect("signal").status, code::OK);
        assert_eq!(b.recv().await.expect("signal").status, code::OK);
    }

    #[tokio::test]
    async fn test_completion_signal_without_subscribers_is_dropped() {
        let hub = StatusHub::new();
        // Must not panic or error when nobody listens.
        hub.signal_completion(StatusInfo::success());
        // A subscriber arriving afterwards sees nothing queued.
        let mut rx = hub.completions();
        assert!(matches!(
            rx.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[tokio::test]
    async fn test_dropping_a_receiver_leaves_hub_usable() {
        let hub = StatusHub::new();
        let rx = hub.subscribe();
        drop(rx);
        hub.publish(StatusInfo::success());
        assert_eq!(hub.latest().status, code::OK);
    }
}
