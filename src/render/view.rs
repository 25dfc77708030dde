use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::core::error::{ReportError, Result};
use crate::render::table::RenderedTable;
use crate::report::payload::ReportPayload;

/// What is currently on display: one table per dataset, then the images
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportView {
    tables: Vec<RenderedTable>,
    images: Vec<String>,
    file_name: Option<String>,
}

impl ReportView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace everything on display with the contents of `payload`
    pub fn apply(&mut self, payload: &ReportPayload) {
        self.clear();
        self.tables = payload
            .csv_data
            .iter()
            .map(RenderedTable::from_dataset)
            .collect();
        self.images = payload.images.clone();
        self.file_name = Some(payload.file_name.clone());
    }

    pub fn clear(&mut self) {
        self.tables.clear();
        self.images.clear();
        self.file_name = None;
    }

    pub fn tables(&self) -> &[RenderedTable] {
        &self.tables
    }

    pub fn images(&self) -> &[String] {
        &self.images
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty() && self.images.is_empty()
    }
}

/// A view plus the rule that only one submission may be outstanding
#[derive(Debug, Default)]
pub struct ReportSession {
    view: Mutex<ReportView>,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag however the submission ends
struct SubmissionGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> SubmissionGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ReportError::SubmissionInFlight)?;
        Ok(Self { flag })
    }
}

impl Drop for SubmissionGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

impl ReportSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Await `request` and draw its payload
    ///
    /// The view is only touched once a payload is in hand; a failed request
    /// leaves the previous report on display. A call made while another is
    /// still pending fails with [`ReportError::SubmissionInFlight`].
    pub async fn submit<F>(&self, request: F) -> Result<()>
    where
        F: Future<Output = Result<ReportPayload>>,
    {
        let _guard = SubmissionGuard::acquire(&self.in_flight)?;
        let payload = request.await?;
        self.lock_view().apply(&payload);
        Ok(())
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Copy of the current view
    pub fn snapshot(&self) -> ReportView {
        self.lock_view().clone()
    }

    fn lock_view(&self) -> MutexGuard<'_, ReportView> {
        // A panic while drawing leaves a complete view behind, so poisoning is ignored
        self.view.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::payload::ReportDataset;
    use std::sync::Arc;
    use tokio::sync::oneshot;

    fn payload(file_name: &str, datasets: &[(&str, &str)], images: &[&str]) -> ReportPayload {
        ReportPayload {
            csv_data: datasets
                .iter()
                .map(|(name, data)| ReportDataset::new(*name, *data))
                .collect(),
            images: images.iter().map(|i| i.to_string()).collect(),
            file_name: file_name.to_string(),
            is_file_uploaded: true,
        }
    }

    #[test]
    fn test_apply_draws_one_table_per_dataset() {
        let mut view = ReportView::new();
        view.apply(&payload(
            "a.pcap",
            &[
                ("protocol_distribution.csv", "p,n\ntcp,3"),
                ("dns_requests.csv", "d\nexample.com"),
            ],
            &["graphs/x/p.png"],
        ));

        assert_eq!(view.tables().len(), 2);
        assert_eq!(view.tables()[0].title, "Protocol Distribution");
        assert_eq!(view.tables()[1].title, "DNS Requests");
        assert_eq!(view.images(), ["graphs/x/p.png"]);
        assert_eq!(view.file_name(), Some("a.pcap"));
    }

    #[test]
    fn test_second_apply_replaces_previous_report() {
        let mut view = ReportView::new();
        view.apply(&payload(
            "first.pcap",
            &[
                ("protocol_distribution.csv", "a\n1"),
                ("top_ip_communications.csv", "b\n2"),
            ],
            &["graphs/one/a.png"],
        ));
        view.apply(&payload("second.pcap", &[("dns_requests.csv", "d\n3")], &[]));

        assert_eq!(view.tables().len(), 1);
        assert_eq!(view.tables()[0].title, "DNS Requests");
        assert!(view.images().is_empty());
        assert_eq!(view.file_name(), Some("second.pcap"));
    }

    #[test]
    fn test_empty_payload_clears_the_view() {
        let mut view = ReportView::new();
        view.apply(&payload("a.pcap", &[("x.csv", "h")], &["graphs/a/b.png"]));
        view.apply(&payload("b.pcap", &[], &[]));

        assert!(view.is_empty());
    }

    #[tokio::test]
    async fn test_submit_success_renders() {
        let session = ReportSession::new();
        let result = session
            .submit(async { Ok(payload("a.pcap", &[("x.csv", "h\nv")], &[])) })
            .await;

        assert!(result.is_ok());
        assert_eq!(session.snapshot().tables().len(), 1);
        assert!(!session.is_submitting());
    }

    #[tokio::test]
    async fn test_failed_submit_leaves_previous_report() {
        let session = ReportSession::new();
        session
            .submit(async { Ok(payload("a.pcap", &[("x.csv", "h\nv")], &["graphs/a/i.png"])) })
            .await
            .unwrap();
        let before = session.snapshot();

        let result = session
            .submit(async {
                Err(ReportError::ServerResponse {
                    status: 500,
                    body: "Error executing Python script".to_string(),
                })
            })
            .await;

        assert!(matches!(result, Err(ReportError::ServerResponse { status: 500, .. })));
        assert_eq!(session.snapshot(), before);
        assert!(!session.is_submitting());
    }

    #[tokio::test]
    async fn test_second_submission_while_pending_is_rejected() {
        let session = Arc::new(ReportSession::new());
        let (release, pending) = oneshot::channel::<()>();

        let first = {
            let session = Arc::clone(&session);
            tokio::spawn(async move {
                session
                    .submit(async move {
                        let _ = pending.await;
                        Ok(payload("slow.pcap", &[("x.csv", "h")], &[]))
                    })
                    .await
            })
        };

        while !session.is_submitting() {
            tokio::task::yield_now().await;
        }

        let second = session
            .submit(async { Ok(payload("fast.pcap", &[], &[])) })
            .await;
        assert!(matches!(second, Err(ReportError::SubmissionInFlight)));

        release.send(()).unwrap();
        first.await.unwrap().unwrap();

        assert_eq!(session.snapshot().file_name(), Some("slow.pcap"));
        assert!(!session.is_submitting());
    }
}
