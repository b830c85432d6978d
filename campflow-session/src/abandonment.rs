//! Idle abandonment: after a quiet period with contact details on file and
//! no completed booking, report the cart once so the campground can follow
//! up.

use campflow_checkout::steps::BookingStep;
use campflow_core::guest::ContactPatch;
use campflow_core::services::AbandonmentSink;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use uuid::Uuid;

pub struct AbandonmentTimer {
    sink: Arc<dyn AbandonmentSink>,
    campground_id: Uuid,
    delay: Duration,
    reported: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl AbandonmentTimer {
    pub fn new(sink: Arc<dyn AbandonmentSink>, campground_id: Uuid, delay_seconds: u64) -> Self {
        Self {
            sink,
            campground_id,
            delay: Duration::from_secs(delay_seconds),
            reported: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }

    /// (Re)start the idle countdown. Each guest interaction calls this, so
    /// the report only fires after a full quiet window. Without an email or
    /// phone there is nobody to follow up with, so the timer stays off.
    pub fn arm(&mut self, contact: ContactPatch) {
        self.disarm();
        if contact.is_empty() || self.reported.load(Ordering::SeqCst) {
            return;
        }
        let sink = self.sink.clone();
        let campground_id = self.campground_id;
        let delay = self.delay;
        let reported = self.reported.clone();
        self.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if reported.swap(true, Ordering::SeqCst) {
                return;
            }
            if let Err(error) = sink
                .report_abandoned_cart(campground_id, &contact, Utc::now())
                .await
            {
                tracing::warn!(%error, "abandoned cart report failed");
            }
        }));
    }

    /// Cancel the pending countdown without marking the session reported.
    pub fn disarm(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    /// The booking completed (or the guest discarded the draft): never
    /// report this session.
    pub fn suppress(&mut self) {
        self.reported.store(true, Ordering::SeqCst);
        self.disarm();
    }

    pub fn has_reported(&self) -> bool {
        self.reported.load(Ordering::SeqCst)
    }

    /// Track the flow after each interaction: a completed checkout is never
    /// reported, a guest at the payment step is left alone while the gateway
    /// round-trip runs, and anything earlier restarts the idle countdown.
    pub fn observe(&mut self, step: BookingStep, contact: ContactPatch) {
        match step {
            BookingStep::Complete => self.suppress(),
            BookingStep::Payment => self.disarm(),
            _ => self.arm(contact),
        }
    }
}

impl Drop for AbandonmentTimer {
    fn drop(&mut self) {
        self.disarm();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use campflow_core::error::ApiError;
    use chrono::{DateTime, Utc};
    use std::sync::atomic::AtomicUsize;

    struct CountingSink {
        reports: AtomicUsize,
        fail: bool,
    }

    impl CountingSink {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                reports: AtomicUsize::new(0),
                fail,
            })
        }
    }

    #[async_trait]
    impl AbandonmentSink for CountingSink {
        async fn report_abandoned_cart(
            &self,
            _campground_id: Uuid,
            _contact: &ContactPatch,
            _at: DateTime<Utc>,
        ) -> Result<(), ApiError> {
            self.reports.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ApiError::Network("crm offline".to_string()));
            }
            Ok(())
        }
    }

    fn contact() -> ContactPatch {
        ContactPatch {
            email: Some("guest@example.com".to_string()),
            ..ContactPatch::default()
        }
    }

    fn timer(sink: Arc<CountingSink>) -> AbandonmentTimer {
        let mut t = AbandonmentTimer::new(sink, Uuid::new_v4(), 0);
        // sub-second delay for tests
        t.delay = Duration::from_millis(20);
        t
    }

    #[tokio::test]
    async fn fires_once_after_delay() {
        let sink = CountingSink::new(false);
        let mut t = timer(sink.clone());
        t.arm(contact());
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(sink.reports.load(Ordering::SeqCst), 1);
        assert!(t.has_reported());

        // once reported, re-arming is inert
        t.arm(contact());
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(sink.reports.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn re_arming_restarts_the_countdown() {
        let sink = CountingSink::new(false);
        let mut t = timer(sink.clone());
        t.arm(contact());
        tokio::time::sleep(Duration::from_millis(10)).await;
        t.arm(contact());
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(sink.reports.load(Ordering::SeqCst), 0);
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(sink.reports.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_contact_never_arms() {
        let sink = CountingSink::new(false);
        let mut t = timer(sink.clone());
        t.arm(ContactPatch::default());
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(sink.reports.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn suppress_blocks_the_report() {
        let sink = CountingSink::new(false);
        let mut t = timer(sink.clone());
        t.arm(contact());
        t.suppress();
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(sink.reports.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn observe_disarms_at_payment_and_suppresses_at_complete() {
        let sink = CountingSink::new(false);
        let mut t = timer(sink.clone());
        t.observe(BookingStep::Details, contact());
        t.observe(BookingStep::Payment, contact());
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(sink.reports.load(Ordering::SeqCst), 0);
        // payment step only pauses; backing out re-arms
        assert!(!t.has_reported());

        t.observe(BookingStep::Complete, contact());
        t.observe(BookingStep::Details, contact());
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(sink.reports.load(Ordering::SeqCst), 0);
        assert!(t.has_reported());
    }

    #[tokio::test]
    async fn sink_failure_is_swallowed_and_not_retried() {
        let sink = CountingSink::new(true);
        let mut t = timer(sink.clone());
        t.arm(contact());
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(sink.reports.load(Ordering::SeqCst), 1);
        assert!(t.has_reported());
    }
}
