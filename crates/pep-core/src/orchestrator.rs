//! Download orchestrator: one illustration id in, one file per page out.
//!
//! Fetches the page list and metadata concurrently, names every page from the
//! stored naming template, starts one download task per page with a fixed pause
//! between starts, then waits for every task before reporting the totals.

use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::api::IllustSource;
use crate::config::PepConfig;
use crate::downloader::FileDownloader;
use crate::illust_id::IllustId;
use crate::naming::{self, NamingContext};
use crate::notify::{Notifier, Toast, ToastKind, DEFAULT_TOAST_DURATION};
use crate::settings::{self, SettingsStore};

pub const UNKNOWN_TITLE: &str = "unknown_title";
pub const UNKNOWN_AUTHOR: &str = "unknown_author";

#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    /// Pause after starting one page before starting the next.
    pub pacing: Duration,
    /// From this many pages on, per-file success toasts are suppressed.
    pub quiet_threshold: usize,
    pub toast_duration: Duration,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            pacing: Duration::from_millis(200),
            quiet_threshold: 5,
            toast_duration: DEFAULT_TOAST_DURATION,
        }
    }
}

impl OrchestratorOptions {
    pub fn from_config(cfg: &PepConfig) -> Self {
        Self {
            pacing: cfg.pacing(),
            quiet_threshold: cfg.quiet_threshold,
            toast_duration: cfg.toast_duration(),
        }
    }
}

/// State of one page's download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    Queued,
    Succeeded,
    Failed,
}

/// Final counts for one `download_by_id` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadSummary {
    pub illust_id: IllustId,
    pub initiated: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Per page, indexed by zero-based page number.
    pub outcomes: Vec<DownloadOutcome>,
}

impl DownloadSummary {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed == 0 && self.succeeded == self.total()
    }
}

pub struct Orchestrator<S, D> {
    source: S,
    downloader: Arc<D>,
    notifier: Arc<dyn Notifier>,
    settings: Arc<dyn SettingsStore>,
    options: OrchestratorOptions,
}

impl<S, D> Orchestrator<S, D>
where
    S: IllustSource,
    D: FileDownloader,
{
    pub fn new(
        source: S,
        downloader: Arc<D>,
        notifier: Arc<dyn Notifier>,
        settings: Arc<dyn SettingsStore>,
        options: OrchestratorOptions,
    ) -> Self {
        Self {
            source,
            downloader,
            notifier,
            settings,
            options,
        }
    }

    /// Downloads every page of `id`.
    ///
    /// Never fails: problems are logged and reported as toasts. Returns `None`
    /// when nothing was downloaded (no pages, or the run could not start).
    pub async fn download_by_id(&self, id: IllustId) -> Option<DownloadSummary> {
        match self.run(id).await {
            Ok(summary) => summary,
            Err(e) => {
                tracing::error!(illust_id = %id, "download of illustration {} failed: {:#}", id, e);
                self.toast(Toast::error(
                    "Download failed",
                    format!("illustration {}: {:#}", id, e),
                ));
                None
            }
        }
    }

    async fn run(&self, id: IllustId) -> anyhow::Result<Option<DownloadSummary>> {
        let (urls, metadata) = tokio::join!(self.source.page_urls(id), self.source.metadata(id));

        if urls.is_empty() {
            tracing::debug!(illust_id = %id, "no page urls found for illustration {}", id);
            return Ok(None);
        }

        let template = settings::naming_template(self.settings.as_ref())
            .context("read naming template")?;
        let (title, author) = match metadata {
            Some(meta) => (meta.title, meta.author_name),
            None => (UNKNOWN_TITLE.to_string(), UNKNOWN_AUTHOR.to_string()),
        };

        let quiet = urls.len() >= self.options.quiet_threshold;
        if quiet {
            self.toast(Toast::info(
                "Notice",
                format!(
                    "{} pages: only failed downloads will be reported individually",
                    urls.len()
                ),
            ));
        }

        let title: Arc<str> = Arc::from(title);
        let mut outcomes = Vec::with_capacity(urls.len());
        let mut handles: Vec<JoinHandle<bool>> = Vec::with_capacity(urls.len());
        let mut initiated = 0usize;

        for (index, url) in urls.iter().enumerate() {
            let ctx = NamingContext {
                title: &title,
                author: &author,
                id: id.get(),
                page: index,
            };
            let filename = naming::derive_filename(&template, &ctx, url);
            tracing::debug!("requesting download: {} from {}", filename, url);

            handles.push(self.spawn_page(index, url.clone(), filename, Arc::clone(&title), quiet));
            outcomes.push(DownloadOutcome::Queued);
            initiated += 1;

            if index + 1 < urls.len() {
                tokio::time::sleep(self.options.pacing).await;
            }
        }

        for (index, handle) in handles.into_iter().enumerate() {
            outcomes[index] = match handle.await {
                Ok(true) => DownloadOutcome::Succeeded,
                Ok(false) => DownloadOutcome::Failed,
                Err(e) => {
                    tracing::error!(illust_id = %id, page = index, "download task failed: {}", e);
                    DownloadOutcome::Failed
                }
            };
        }

        let succeeded = count(&outcomes, DownloadOutcome::Succeeded);
        let failed = count(&outcomes, DownloadOutcome::Failed);
        let kind = if failed == 0 {
            ToastKind::Success
        } else {
            ToastKind::Error
        };
        let totals = format!(
            "{} total, {} succeeded, {} failed",
            urls.len(),
            succeeded,
            failed
        );
        self.toast(Toast::new("All downloads finished", totals.clone(), kind));
        tracing::info!(illust_id = %id, "all downloads finished: {}", totals);

        Ok(Some(DownloadSummary {
            illust_id: id,
            initiated,
            succeeded,
            failed,
            outcomes,
        }))
    }

    fn spawn_page(
        &self,
        index: usize,
        url: String,
        filename: String,
        title: Arc<str>,
        quiet: bool,
    ) -> JoinHandle<bool> {
        let downloader = Arc::clone(&self.downloader);
        let notifier = Arc::clone(&self.notifier);
        let duration = self.options.toast_duration;
        tokio::spawn(async move {
            let page = format!("{} | page {}", title, index + 1);
            match downloader.download(&url, &filename).await {
                Ok(bytes) => {
                    tracing::debug!("saved {} ({} bytes)", filename, bytes);
                    if !quiet {
                        notifier.show(Toast::success("Download succeeded", page).with_duration(duration));
                    }
                    true
                }
                Err(e) => {
                    tracing::error!("download of {} failed: {}", filename, e);
                    notifier.show(Toast::error("Download failed", page).with_duration(duration));
                    false
                }
            }
        })
    }

    fn toast(&self, toast: Toast) {
        self.notifier
            .show(toast.with_duration(self.options.toast_duration));
    }
}

fn count(outcomes: &[DownloadOutcome], wanted: DownloadOutcome) -> usize {
    outcomes.iter().filter(|o| **o == wanted).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::IllustMetadata;
    use crate::downloader::DownloadError;
    use crate::settings::{MemorySettings, SettingValue, NAMING_FORMAT_KEY};
    use std::sync::Mutex;
    use tokio::time::Instant;

    struct FakeSource {
        urls: Vec<String>,
        metadata: Option<IllustMetadata>,
    }

    impl IllustSource for FakeSource {
        async fn page_urls(&self, _id: IllustId) -> Vec<String> {
            self.urls.clone()
        }

        async fn metadata(&self, _id: IllustId) -> Option<IllustMetadata> {
            self.metadata.clone()
        }
    }

    /// Records every call; URLs containing "fail" error out, "panic" panics.
    #[derive(Default)]
    struct FakeDownloader {
        calls: Mutex<Vec<(String, String)>>,
        started: Mutex<Vec<Instant>>,
    }

    impl FakeDownloader {
        fn names(&self) -> Vec<String> {
            self.calls.lock().unwrap().iter().map(|(_, n)| n.clone()).collect()
        }

        fn start_gaps(&self) -> Vec<Duration> {
            let started = self.started.lock().unwrap();
            started.windows(2).map(|w| w[1] - w[0]).collect()
        }
    }

    impl FileDownloader for FakeDownloader {
        async fn download(&self, url: &str, name: &str) -> Result<u64, DownloadError> {
            self.started.lock().unwrap().push(Instant::now());
            self.calls
                .lock()
                .unwrap()
                .push((url.to_string(), name.to_string()));
            if url.contains("panic") {
                panic!("downloader blew up");
            }
            if url.contains("fail") {
                return Err(DownloadError::Storage(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "disk full",
                )));
            }
            Ok(10)
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        toasts: Mutex<Vec<Toast>>,
    }

    impl RecordingNotifier {
        fn toasts(&self) -> Vec<Toast> {
            self.toasts.lock().unwrap().clone()
        }

        fn count(&self, kind: ToastKind) -> usize {
            self.toasts().iter().filter(|t| t.kind == kind).count()
        }
    }

    impl Notifier for RecordingNotifier {
        fn show(&self, toast: Toast) {
            self.toasts.lock().unwrap().push(toast);
        }
    }

    struct Harness {
        orchestrator: Orchestrator<FakeSource, FakeDownloader>,
        downloader: Arc<FakeDownloader>,
        notifier: Arc<RecordingNotifier>,
        settings: Arc<MemorySettings>,
    }

    fn harness(urls: &[&str], metadata: Option<(&str, &str)>) -> Harness {
        harness_paced(urls, metadata, Duration::from_millis(1))
    }

    fn harness_paced(urls: &[&str], metadata: Option<(&str, &str)>, pacing: Duration) -> Harness {
        let source = FakeSource {
            urls: urls.iter().map(|u| u.to_string()).collect(),
            metadata: metadata.map(|(title, author)| IllustMetadata {
                title: title.to_string(),
                author_name: author.to_string(),
            }),
        };
        let downloader = Arc::new(FakeDownloader::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let settings = Arc::new(MemorySettings::new());
        let options = OrchestratorOptions {
            pacing,
            ..OrchestratorOptions::default()
        };
        let orchestrator = Orchestrator::new(
            source,
            Arc::clone(&downloader),
            notifier.clone(),
            settings.clone(),
            options,
        );
        Harness {
            orchestrator,
            downloader,
            notifier,
            settings,
        }
    }

    fn id(n: u64) -> IllustId {
        IllustId::new(n).unwrap()
    }

    #[tokio::test]
    async fn no_pages_means_no_downloads_and_no_toasts() {
        let h = harness(&[], Some(("t", "a")));
        let summary = h.orchestrator.download_by_id(id(1)).await;
        assert!(summary.is_none());
        assert!(h.downloader.names().is_empty());
        assert!(h.notifier.toasts().is_empty());
    }

    /// Collects formatted log output for one test.
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn lines(&self) -> Vec<String> {
            let buf = self.0.lock().unwrap();
            String::from_utf8_lossy(&buf).lines().map(str::to_string).collect()
        }
    }

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn no_pages_logs_one_debug_line() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let h = harness(&[], Some(("t", "a")));
        assert!(h.orchestrator.download_by_id(id(42)).await.is_none());

        let lines = logs.lines();
        assert_eq!(lines.len(), 1, "{lines:?}");
        assert!(lines[0].contains("DEBUG"), "{}", lines[0]);
        assert!(lines[0].contains("no page urls found for illustration 42"));
    }

    #[tokio::test(start_paused = true)]
    async fn downloads_start_one_pacing_interval_apart() {
        let pacing = Duration::from_millis(100);
        let h = harness_paced(
            &["https://h/a/6_p0.png", "https://h/a/6_p1.png", "https://h/a/6_p2.png"],
            Some(("t", "a")),
            pacing,
        );
        let begin = Instant::now();
        let summary = h.orchestrator.download_by_id(id(6)).await.unwrap();
        let elapsed = begin.elapsed();

        assert_eq!(summary.succeeded, 3);
        let gaps = h.downloader.start_gaps();
        assert_eq!(gaps.len(), 2);
        for gap in &gaps {
            assert!(*gap >= pacing, "gap {gap:?} shorter than {pacing:?}");
        }
        // No pause after the last page.
        assert!(elapsed < pacing * 3, "took {elapsed:?}");
    }

    #[tokio::test]
    async fn toasts_carry_configured_duration() {
        let h = harness(&["https://h/a/8_p0.png"], Some(("t", "a")));
        let summary = h.orchestrator.download_by_id(id(8)).await.unwrap();
        assert!(summary.all_succeeded());
        let toasts = h.notifier.toasts();
        assert_eq!(toasts.len(), 2);
        assert!(toasts
            .iter()
            .all(|t| t.duration == OrchestratorOptions::default().toast_duration));

        let h = harness(&["https://h/a/8_p0.png"], Some(("t", "a")));
        let short = Orchestrator::new(
            FakeSource {
                urls: vec!["https://h/a/8_p0.png".to_string()],
                metadata: None,
            },
            Arc::clone(&h.downloader),
            h.notifier.clone(),
            h.settings.clone(),
            OrchestratorOptions {
                pacing: Duration::from_millis(1),
                quiet_threshold: 5,
                toast_duration: Duration::from_millis(750),
            },
        );
        short.download_by_id(id(8)).await.unwrap();
        assert!(h
            .notifier
            .toasts()
            .iter()
            .all(|t| t.duration == Duration::from_millis(750)));
    }

    #[tokio::test]
    async fn no_pages_and_no_metadata_is_silent() {
        let h = harness(&[], None);
        assert!(h.orchestrator.download_by_id(id(1)).await.is_none());
        assert!(h.downloader.names().is_empty());
        assert!(h.notifier.toasts().is_empty());
    }

    #[tokio::test]
    async fn default_template_names_pages_in_order() {
        let h = harness(
            &["https://i.pixiv.re/x/77_p0.png", "https://i.pixiv.re/x/77_p1.jpg"],
            Some(("Sunset", "painter")),
        );
        let summary = h.orchestrator.download_by_id(id(77)).await.unwrap();
        assert_eq!(h.downloader.names(), vec!["77-0.png", "77-1.jpg"]);
        assert_eq!(summary.initiated, 2);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 0);
        assert!(summary.all_succeeded());
    }

    #[tokio::test]
    async fn missing_metadata_uses_placeholders() {
        let h = harness(&["https://h/a/7_p0.png", "https://h/a/7_p1.png"], None);
        h.settings
            .set(NAMING_FORMAT_KEY, "{title}-{author}-{id}-{p}".into());
        let summary = h.orchestrator.download_by_id(id(7)).await.unwrap();
        assert_eq!(
            h.downloader.names(),
            vec![
                "unknown_title-unknown_author-7-0.png",
                "unknown_title-unknown_author-7-1.png"
            ]
        );
        assert_eq!(summary.total(), 2);
        let toasts = h.notifier.toasts();
        assert_eq!(h.notifier.count(ToastKind::Success), 3);
        assert!(toasts.iter().any(|t| t.message == "unknown_title | page 2"));
        assert_eq!(toasts.last().unwrap().message, "2 total, 2 succeeded, 0 failed");
    }

    #[tokio::test]
    async fn title_is_sanitized_in_filename() {
        let h = harness(&["https://h/a/123_p0.jpg"], Some(("My:Art", "x")));
        h.settings.set(NAMING_FORMAT_KEY, "{title}-{id}-{p}".into());
        h.orchestrator.download_by_id(id(123)).await.unwrap();
        assert_eq!(h.downloader.names(), vec!["My_Art-123-0.jpg"]);
    }

    #[tokio::test]
    async fn quiet_mode_suppresses_success_but_not_failure() {
        let h = harness(
            &[
                "https://h/a/1_p0.png",
                "https://h/a/1_p1.png",
                "https://h/fail/1_p2.png",
                "https://h/a/1_p3.png",
                "https://h/a/1_p4.png",
            ],
            Some(("Big", "x")),
        );
        let summary = h.orchestrator.download_by_id(id(1)).await.unwrap();
        let toasts = h.notifier.toasts();

        assert_eq!(toasts[0].kind, ToastKind::Info);
        assert_eq!(h.notifier.count(ToastKind::Info), 1);
        assert_eq!(h.notifier.count(ToastKind::Success), 0);
        let errors: Vec<_> = toasts.iter().filter(|t| t.kind == ToastKind::Error).collect();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].message, "Big | page 3");
        assert_eq!(errors[1].message, "5 total, 4 succeeded, 1 failed");

        assert_eq!(summary.initiated, 5);
        assert_eq!(summary.succeeded, 4);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.outcomes[2], DownloadOutcome::Failed);
        assert!(!summary.all_succeeded());
    }

    #[tokio::test]
    async fn below_threshold_reports_each_success() {
        let h = harness(
            &["https://h/a/1_p0.png", "https://h/fail/1_p1.png"],
            Some(("Small", "x")),
        );
        h.orchestrator.download_by_id(id(1)).await.unwrap();
        assert_eq!(h.notifier.count(ToastKind::Info), 0);
        let toasts = h.notifier.toasts();
        assert!(toasts
            .iter()
            .any(|t| t.kind == ToastKind::Success && t.message == "Small | page 1"));
        assert!(toasts
            .iter()
            .any(|t| t.kind == ToastKind::Error && t.message == "Small | page 2"));
    }

    #[tokio::test]
    async fn summary_counts_every_finished_download() {
        let urls: Vec<String> = (0..8).map(|i| format!("https://h/a/9_p{}.png", i)).collect();
        let refs: Vec<&str> = urls.iter().map(String::as_str).collect();
        let h = harness(&refs, Some(("t", "a")));
        let summary = h.orchestrator.download_by_id(id(9)).await.unwrap();
        assert_eq!(summary.succeeded + summary.failed, 8);
        assert!(summary
            .outcomes
            .iter()
            .all(|o| *o != DownloadOutcome::Queued));
    }

    #[tokio::test]
    async fn panicking_download_counts_as_failed() {
        let h = harness(
            &["https://h/a/3_p0.png", "https://h/panic/3_p1.png"],
            Some(("t", "a")),
        );
        let summary = h.orchestrator.download_by_id(id(3)).await.unwrap();
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.outcomes[1], DownloadOutcome::Failed);
    }

    #[tokio::test]
    async fn bad_template_value_is_reported_not_propagated() {
        let h = harness(&["https://h/a/4_p0.png"], Some(("t", "a")));
        h.settings.set(NAMING_FORMAT_KEY, SettingValue::Bool(true));
        let summary = h.orchestrator.download_by_id(id(4)).await;
        assert!(summary.is_none());
        assert!(h.downloader.names().is_empty());
        let toasts = h.notifier.toasts();
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts[0].kind, ToastKind::Error);
        assert!(toasts[0].message.contains("illustration 4"));
    }

    #[tokio::test]
    async fn repeated_calls_are_not_deduplicated() {
        let h = harness(
            &["https://h/a/5_p0.png", "https://h/a/5_p1.png"],
            Some(("t", "a")),
        );
        let first = h.orchestrator.download_by_id(id(5)).await.unwrap();
        let second = h.orchestrator.download_by_id(id(5)).await.unwrap();
        assert_eq!(first, second);
        let calls = h.downloader.calls.lock().unwrap().clone();
        assert_eq!(calls.len(), 4);
        assert_eq!(calls[..2], calls[2..]);
    }

    #[test]
    fn options_from_config() {
        let cfg = PepConfig {
            pacing_ms: 50,
            quiet_threshold: 3,
            toast_duration_ms: 1000,
            ..PepConfig::default()
        };
        let opts = OrchestratorOptions::from_config(&cfg);
        assert_eq!(opts.pacing, Duration::from_millis(50));
        assert_eq!(opts.quiet_threshold, 3);
        assert_eq!(opts.toast_duration, Duration::from_millis(1000));
    }
}
