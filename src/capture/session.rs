//! Capture sessions and the interception seam.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::Deserialize;
use serde_json::Value;

use crate::capture::asset::{AssetRecord, AssetStore};
use crate::capture::export::{export_with_fallback, ExportTarget};
use crate::capture::extract::{extract_assets, is_media_url};
use crate::capture::CaptureError;
use crate::observability::metrics;

/// Receives intercepted responses and accumulates asset records.
#[derive(Debug, Clone, Default)]
pub struct CaptureSink {
    store: Arc<Mutex<AssetStore>>,
}

impl CaptureSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn store(&self) -> MutexGuard<'_, AssetStore> {
        self.store.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Feed one raw response. Ignored unless the URL is a media-library
    /// endpoint and the body is JSON. Returns the number of records seen.
    pub fn observe(&self, url: &str, body: &str) -> usize {
        if !is_media_url(url) {
            return 0;
        }
        match serde_json::from_str::<Value>(body) {
            Ok(value) => self.observe_json(url, &value),
            Err(e) => {
                tracing::debug!(url, error = %e, "Ignoring non-JSON media response");
                0
            }
        }
    }

    /// Feed one already-decoded response.
    pub fn observe_json(&self, url: &str, body: &Value) -> usize {
        if !is_media_url(url) {
            return 0;
        }
        let records = extract_assets(body);
        let seen = records.len();
        let mut store = self.store();
        for record in records {
            store.upsert(record);
        }
        if seen > 0 {
            metrics::record_captured_assets(seen);
            tracing::debug!(url, seen, total = store.len(), "Captured asset records");
        }
        seen
    }

    pub fn assets(&self) -> Vec<AssetRecord> {
        self.store().records().to_vec()
    }

    pub fn len(&self) -> usize {
        self.store().len()
    }

    pub fn is_empty(&self) -> bool {
        self.store().is_empty()
    }
}

/// Source of intercepted responses.
///
/// `install` hands the interceptor the sink to feed; `uninstall` must stop
/// all further delivery and restore whatever was hooked.
pub trait Interceptor {
    fn install(&mut self, sink: CaptureSink) -> Result<(), CaptureError>;

    fn uninstall(&mut self);
}

/// One start→stop capture lifecycle. The interceptor is uninstalled on
/// [`stop`](Self::stop) or when the session is dropped.
pub struct CaptureSession<I: Interceptor> {
    interceptor: I,
    sink: CaptureSink,
    installed: bool,
}

impl<I: Interceptor> CaptureSession<I> {
    pub fn start(mut interceptor: I) -> Result<Self, CaptureError> {
        let sink = CaptureSink::new();
        interceptor.install(sink.clone())?;
        tracing::info!("Asset capture started");
        Ok(Self {
            interceptor,
            sink,
            installed: true,
        })
    }

    pub fn assets(&self) -> Vec<AssetRecord> {
        self.sink.assets()
    }

    pub fn len(&self) -> usize {
        self.sink.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sink.is_empty()
    }

    /// Uninstall the interceptor and hand back what was captured.
    pub fn stop(mut self) -> Vec<AssetRecord> {
        self.teardown();
        self.sink.assets()
    }

    fn teardown(&mut self) {
        if self.installed {
            self.interceptor.uninstall();
            self.installed = false;
            tracing::info!(assets = self.sink.len(), "Asset capture stopped");
        }
    }
}

impl<I: Interceptor> Drop for CaptureSession<I> {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Result of one [`CaptureToggle::toggle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    Started,
    /// Nothing captured yet; capture continues.
    Empty,
    Exported { count: usize, target: String },
}

/// Single entry point that starts capture on first use and exports on the
/// next use that finds records.
pub struct CaptureToggle<I: Interceptor> {
    session: Option<CaptureSession<I>>,
}

impl<I: Interceptor> Default for CaptureToggle<I> {
    fn default() -> Self {
        Self { session: None }
    }
}

impl<I: Interceptor> CaptureToggle<I> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_capturing(&self) -> bool {
        self.session.is_some()
    }

    /// Records captured so far by the running session.
    pub fn assets(&self) -> Vec<AssetRecord> {
        self.session.as_ref().map(CaptureSession::assets).unwrap_or_default()
    }

    /// Start, report empty, or export and stop.
    ///
    /// A failed export leaves the session running so nothing is lost.
    pub fn toggle<F>(
        &mut self,
        interceptor: F,
        primary: &dyn ExportTarget,
        fallback: &dyn ExportTarget,
    ) -> Result<ToggleOutcome, CaptureError>
    where
        F: FnOnce() -> I,
    {
        let records = match &self.session {
            None => {
                self.session = Some(CaptureSession::start(interceptor())?);
                return Ok(ToggleOutcome::Started);
            }
            Some(session) if session.is_empty() => return Ok(ToggleOutcome::Empty),
            Some(session) => session.assets(),
        };

        let target = export_with_fallback(&records, primary, fallback)?;
        if let Some(session) = self.session.take() {
            session.stop();
        }
        Ok(ToggleOutcome::Exported {
            count: records.len(),
            target,
        })
    }
}

/// A previously recorded response.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordedExchange {
    pub url: String,
    /// Decoded JSON, or a string holding the raw body text.
    pub body: Value,
}

/// Replays recorded responses into the sink on install.
#[derive(Debug, Default)]
pub struct ReplayInterceptor {
    exchanges: Vec<RecordedExchange>,
    sink: Option<CaptureSink>,
}

impl ReplayInterceptor {
    pub fn new(exchanges: Vec<RecordedExchange>) -> Self {
        Self {
            exchanges,
            sink: None,
        }
    }

    pub fn is_installed(&self) -> bool {
        self.sink.is_some()
    }

    /// Deliver one more response while installed. Returns false once
    /// uninstalled.
    pub fn deliver(&self, exchange: &RecordedExchange) -> bool {
        match &self.sink {
            Some(sink) => {
                match &exchange.body {
                    Value::String(raw) => sink.observe(&exchange.url, raw),
                    other => sink.observe_json(&exchange.url, other),
                };
                true
            }
            None => false,
        }
    }
}

impl Interceptor for ReplayInterceptor {
    fn install(&mut self, sink: CaptureSink) -> Result<(), CaptureError> {
        if self.sink.is_some() {
            return Err(CaptureError::AlreadyInstalled);
        }
        self.sink = Some(sink);
        let exchanges = std::mem::take(&mut self.exchanges);
        for exchange in &exchanges {
            self.deliver(exchange);
        }
        self.exchanges = exchanges;
        Ok(())
    }

    fn uninstall(&mut self) {
        self.sink = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::export::tests::MemoryTarget;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts install/uninstall calls.
    struct Probe {
        uninstalls: Arc<AtomicUsize>,
        sink: Option<CaptureSink>,
    }

    impl Interceptor for Probe {
        fn install(&mut self, sink: CaptureSink) -> Result<(), CaptureError> {
            self.sink = Some(sink);
            Ok(())
        }

        fn uninstall(&mut self) {
            self.sink = None;
            self.uninstalls.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn probe() -> (Probe, Arc<AtomicUsize>) {
        let uninstalls = Arc::new(AtomicUsize::new(0));
        (
            Probe {
                uninstalls: uninstalls.clone(),
                sink: None,
            },
            uninstalls,
        )
    }

    fn exchange(url: &str, body: Value) -> RecordedExchange {
        RecordedExchange {
            url: url.to_string(),
            body,
        }
    }

    #[test]
    fn test_sink_filters_urls_and_bad_json() {
        let sink = CaptureSink::new();
        assert_eq!(sink.observe("/orders", r#"{"results": [{"id": "a"}]}"#), 0);
        assert_eq!(sink.observe("/searchMediaMetadata", "<html>"), 0);
        assert_eq!(sink.observe("/searchMediaMetadata", r#"{"results": [{"id": "a"}]}"#), 1);
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_stop_uninstalls_once() {
        let (interceptor, uninstalls) = probe();
        let session = CaptureSession::start(interceptor).unwrap();
        session.stop();
        assert_eq!(uninstalls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_uninstalls() {
        let (interceptor, uninstalls) = probe();
        {
            let _session = CaptureSession::start(interceptor).unwrap();
        }
        assert_eq!(uninstalls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_replay_feeds_on_install() {
        let replay = ReplayInterceptor::new(vec![
            exchange("/getMediaMetadata", json!({"media": [{"mediaId": "a", "fileName": "a.jpg"}]})),
            exchange("/getMediaMetadata", json!(r#"[{"mediaId": "b"}]"#)),
            exchange("/elsewhere", json!([{"mediaId": "c"}])),
            exchange("/getMediaMetadata", json!({"media": [{"mediaId": "a", "fileName": "a-v2.jpg"}]})),
        ]);
        let session = CaptureSession::start(replay).unwrap();

        let assets = session.stop();
        let ids: Vec<&str> = assets.iter().map(|a| a.asset_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(assets[0].filename, "a-v2.jpg");
    }

    #[test]
    fn test_replay_stops_delivering_after_uninstall() {
        let mut replay = ReplayInterceptor::new(Vec::new());
        replay.install(CaptureSink::new()).unwrap();
        assert!(matches!(replay.install(CaptureSink::new()), Err(CaptureError::AlreadyInstalled)));
        replay.uninstall();
        assert!(!replay.deliver(&exchange("/media-library", json!([{"id": "x"}]))));
    }

    #[test]
    fn test_toggle_lifecycle() {
        let primary = MemoryTarget::failing("clipboard");
        let fallback = MemoryTarget::new("textarea");
        let mut toggle = CaptureToggle::new();

        let outcome = toggle
            .toggle(|| ReplayInterceptor::new(Vec::new()), &primary, &fallback)
            .unwrap();
        assert_eq!(outcome, ToggleOutcome::Started);

        let outcome = toggle
            .toggle(|| unreachable!("already capturing"), &primary, &fallback)
            .unwrap();
        assert_eq!(outcome, ToggleOutcome::Empty);
        assert!(toggle.is_capturing());

        if let Some(session) = &toggle.session {
            session
                .sink
                .observe_json("/searchMediaMetadata", &json!({"results": [{"id": "x.png"}]}));
        }

        let outcome = toggle
            .toggle(|| unreachable!("already capturing"), &primary, &fallback)
            .unwrap();
        assert_eq!(
            outcome,
            ToggleOutcome::Exported {
                count: 1,
                target: "textarea".to_string()
            }
        );
        assert!(!toggle.is_capturing());
        assert!(fallback.contents().contains("\"assetId\": \"x.png\""));
    }
}
