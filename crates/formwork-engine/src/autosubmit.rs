//! Debounced autosubmit scheduling.
//!
//! Observes qualifying field notifications and arms a single debounce timer;
//! each new qualifying notification cancels the pending timer and starts a
//! fresh one. Scheduling is an explicit opt-in: disabled, or a zero debounce
//! delay, disables it entirely. The pending timer is cancelled on every
//! manual submit and on teardown.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

use formwork_types::config::AutosubmitConfig;
use formwork_types::notification::NotificationKind;

/// The armed timer, tagged with its scheduling generation so a fired task
/// can tell whether it is still the current one.
type PendingTimer = Option<(u64, JoinHandle<()>)>;

pub struct AutosubmitScheduler {
    config: AutosubmitConfig,
    pending: Arc<Mutex<PendingTimer>>,
    generation: u64,
}

impl AutosubmitScheduler {
    pub fn new(config: AutosubmitConfig) -> Self {
        Self {
            config,
            pending: Arc::new(Mutex::new(None)),
            generation: 0,
        }
    }

    /// A scheduler that never fires.
    pub fn disarmed() -> Self {
        Self::new(AutosubmitConfig::default())
    }

    /// Replace the policy; any pending timer is cancelled.
    pub fn set_config(&mut self, config: AutosubmitConfig) {
        self.cancel();
        self.config = config;
    }

    /// Whether a notification of this kind for this field arms the timer.
    pub fn qualifies(&self, kind: NotificationKind, field_id: &str) -> bool {
        self.config.is_armed()
            && self.config.events.contains(&kind)
            && !self.config.exclude_fields.iter().any(|f| f == field_id)
    }

    /// Arm the debounce timer, cancelling any pending one. `fire` runs after
    /// the configured delay unless superseded or cancelled.
    pub fn schedule<F, Fut>(&mut self, fire: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        if !self.config.is_armed() {
            return;
        }
        self.cancel();
        self.generation += 1;
        let generation = self.generation;
        let delay = Duration::from_millis(self.config.debounce_ms);
        debug!(delay_ms = self.config.debounce_ms, "Autosubmit timer armed");

        let pending = Arc::clone(&self.pending);
        // Hold the slot across the spawn so the timer task cannot observe it
        // before its own handle is stored.
        let mut slot = self.pending.lock();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            {
                // Detach our own handle before firing. `fire` typically
                // starts a submission whose first act is cancelling this
                // scheduler; it must not abort the task it is running on.
                let mut slot = pending.lock();
                match slot.take() {
                    Some((pending_generation, _)) if pending_generation == generation => {}
                    superseded => {
                        *slot = superseded;
                        return;
                    }
                }
            }
            fire().await;
        });
        *slot = Some((generation, handle));
    }

    /// Cancel the pending timer, if any. A timer that has already fired and
    /// detached itself is unaffected.
    pub fn cancel(&mut self) {
        if let Some((_, handle)) = self.pending.lock().take() {
            handle.abort();
        }
    }
}

impl Drop for AutosubmitScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::time::sleep;

    fn armed(debounce_ms: u64) -> AutosubmitScheduler {
        AutosubmitScheduler::new(AutosubmitConfig {
            enabled: true,
            debounce_ms,
            exclude_fields: vec!["promo_code".into()],
            ..Default::default()
        })
    }

    #[test]
    fn test_qualifies() {
        let scheduler = armed(500);
        assert!(scheduler.qualifies(NotificationKind::Change, "email"));
        assert!(!scheduler.qualifies(NotificationKind::Input, "email"));
        assert!(!scheduler.qualifies(NotificationKind::Change, "promo_code"));
    }

    #[test]
    fn test_disarmed_never_qualifies() {
        let scheduler = AutosubmitScheduler::disarmed();
        assert!(!scheduler.qualifies(NotificationKind::Change, "email"));
    }

    #[test]
    fn test_zero_debounce_never_qualifies() {
        let scheduler = armed(0);
        assert!(!scheduler.qualifies(NotificationKind::Change, "email"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_after_delay() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut scheduler = armed(500);
        {
            let fired = fired.clone();
            scheduler.schedule(move || async move {
                fired.fetch_add(1, Ordering::SeqCst);
            });
        }
        sleep(Duration::from_millis(499)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        sleep(Duration::from_millis(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_coalesces() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut scheduler = armed(500);
        for _ in 0..2 {
            let fired = fired.clone();
            scheduler.schedule(move || async move {
                fired.fetch_add(1, Ordering::SeqCst);
            });
            sleep(Duration::from_millis(100)).await;
        }
        // 500ms after the second arm, exactly one fire.
        sleep(Duration::from_millis(600)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_fire() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut scheduler = armed(500);
        {
            let fired = fired.clone();
            scheduler.schedule(move || async move {
                fired.fetch_add(1, Ordering::SeqCst);
            });
        }
        scheduler.cancel();
        sleep(Duration::from_millis(1000)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_after_fire_leaves_running_fire_alone() {
        // Once the timer fired, the work it started must survive a cancel
        // (a manual submit cancels the scheduler while the autosubmit-
        // started submission is still awaiting its handlers).
        let fired = Arc::new(AtomicUsize::new(0));
        let mut scheduler = armed(500);
        {
            let fired = fired.clone();
            scheduler.schedule(move || async move {
                sleep(Duration::from_millis(100)).await;
                fired.fetch_add(1, Ordering::SeqCst);
            });
        }
        // Past the delay: the fire body is mid-await.
        sleep(Duration::from_millis(550)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        scheduler.cancel();

        sleep(Duration::from_millis(100)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disarmed_schedule_is_noop() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut scheduler = AutosubmitScheduler::disarmed();
        {
            let fired = fired.clone();
            scheduler.schedule(move || async move {
                fired.fetch_add(1, Ordering::SeqCst);
            });
        }
        sleep(Duration::from_millis(10_000)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}
