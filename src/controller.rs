//! The run controller: owns the discovery loop and its observable state.

use crate::acquisition::AcquisitionStrategy;
use crate::analyzer::WebsiteAnalyzer;
use crate::config::{Config, pacing_delay};
use crate::countries::get_country;
use crate::dedup::DuplicateGuard;
use crate::error::{AppError, Result};
use crate::fetch::{HttpFetcher, build_http_client};
use crate::models::{Candidate, Lead, LeadStats, Locality, RunStatus};
use crate::router::{DestinationRouter, PartitionGranularity, PartitionHandle};
use crate::scorer::{LeadScorer, ScoreInput};
use crate::store::TabularStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{self, error::SendTimeoutError};
use tokio::sync::{Mutex, Notify, RwLock};
use tokio::task::JoinHandle;

/// The stages a candidate passes through. Held by the worker for a whole run.
pub(crate) struct Pipeline {
    acquisition: AcquisitionStrategy,
    analyzer: WebsiteAnalyzer,
    scorer: LeadScorer,
    guard: DuplicateGuard,
    router: DestinationRouter,
}

impl Pipeline {
    pub(crate) fn new(
        acquisition: AcquisitionStrategy,
        analyzer: WebsiteAnalyzer,
        scorer: LeadScorer,
        store: Arc<dyn TabularStore>,
        granularity: PartitionGranularity,
    ) -> Self {
        Self {
            acquisition,
            analyzer,
            scorer,
            guard: DuplicateGuard::new(store.clone()),
            router: DestinationRouter::new(store, granularity),
        }
    }

    pub(crate) fn from_config(config: &Config, store: Arc<dyn TabularStore>) -> Result<Self> {
        let http_client = build_http_client(config)?;
        let fetcher = Arc::new(HttpFetcher::new(http_client.clone(), config.request_timeout));
        Ok(Self::new(
            AcquisitionStrategy::from_config(config, http_client, fetcher.clone()),
            WebsiteAnalyzer::new(fetcher),
            LeadScorer::new(config.score_weights),
            store,
            config.partition_by,
        ))
    }
}

/// Per-controller knobs taken from the configuration.
#[derive(Debug, Clone)]
pub(crate) struct RunSettings {
    pub max_results_per_category: usize,
    pub delay_between_requests: Duration,
    pub delay_between_searches: Duration,
    pub pacing_jitter: Duration,
    /// Applied only to long-running runs.
    pub max_session: Duration,
    pub default_categories: Vec<String>,
    /// How long a saved lead waits for room in a full notification channel.
    pub notify_timeout: Duration,
}

const NOTIFY_TIMEOUT: Duration = Duration::from_secs(5);

impl RunSettings {
    pub(crate) fn from_config(config: &Config) -> Self {
        Self {
            max_results_per_category: config.max_results_per_category,
            delay_between_requests: config.delay_between_requests,
            delay_between_searches: config.delay_between_searches,
            pacing_jitter: config.pacing_jitter,
            max_session: config.max_session,
            default_categories: config.default_categories.clone(),
            notify_timeout: NOTIFY_TIMEOUT,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub(crate) struct StartRequest {
    pub country: String,
    pub city: String,
    /// Empty or missing means the configured default list.
    #[serde(default)]
    pub categories: Option<Vec<String>>,
    #[serde(default)]
    pub long_running: bool,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub(crate) enum RunOutcome {
    Completed,
    Stopped,
    TimeLimitReached,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub(crate) struct RunSummary {
    pub run_id: String,
    pub categories_processed: usize,
    pub leads_saved: usize,
    /// Saved leads whose channel notification timed out or found the channel closed.
    pub notifications_dropped: usize,
    pub outcome: RunOutcome,
}

#[derive(Default)]
struct RunState {
    is_running: AtomicBool,
    should_stop: AtomicBool,
    generation: AtomicU64,
    stop_signal: Notify,
    run_id: RwLock<String>,
    locality: RwLock<Option<Locality>>,
    category: RwLock<Option<String>>,
    message: RwLock<Option<String>>,
    leads: RwLock<Vec<Lead>>,
}

/// Eight hex characters of a v4 UUID. One per controller, shared by all its runs.
fn new_run_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..8].to_string()
}

/// Clears the running flag when the worker ends, including by panic.
struct RunGuard {
    state: Arc<RunState>,
    generation: u64,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        if self.state.generation.load(Ordering::SeqCst) == self.generation {
            self.state.is_running.store(false, Ordering::SeqCst);
        }
    }
}

/// Starts, stops and reports on discovery runs. Cheap to clone.
#[derive(Clone)]
pub(crate) struct RunController {
    state: Arc<RunState>,
    pipeline: Arc<Mutex<Pipeline>>,
    settings: Arc<RunSettings>,
    has_source: bool,
    notifier: Option<mpsc::Sender<Lead>>,
}

impl RunController {
    pub(crate) fn new(pipeline: Pipeline, settings: RunSettings) -> Self {
        Self {
            has_source: pipeline.acquisition.has_source(),
            state: Arc::new(RunState {
                run_id: RwLock::new(new_run_id()),
                ..RunState::default()
            }),
            pipeline: Arc::new(Mutex::new(pipeline)),
            settings: Arc::new(settings),
            notifier: None,
        }
    }

    /// Every saved lead is also offered to this channel.
    pub(crate) fn with_notifier(mut self, notifier: mpsc::Sender<Lead>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Validates the request and spawns the worker.
    pub(crate) async fn start(&self, request: StartRequest) -> Result<JoinHandle<RunSummary>> {
        if self.state.is_running.load(Ordering::SeqCst) {
            return Err(AppError::AlreadyRunning(self.state.run_id.read().await.clone()));
        }

        let country = get_country(&request.country)
            .ok_or_else(|| AppError::UnsupportedCountry(request.country.clone()))?;
        let city = request.city.trim();
        if city.is_empty() {
            return Err(AppError::InsufficientInput("City is required".to_string()));
        }
        if !self.has_source {
            return Err(AppError::Config(
                "missing required external credentials: no Places API key and scraping fallback disabled"
                    .to_string(),
            ));
        }

        let mut categories: Vec<String> = request
            .categories
            .unwrap_or_default()
            .into_iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        if categories.is_empty() {
            categories = self.settings.default_categories.clone();
        }

        if self
            .state
            .is_running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(AppError::AlreadyRunning(self.state.run_id.read().await.clone()));
        }
        let generation = self.state.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.should_stop.store(false, Ordering::SeqCst);

        let run_id = self.state.run_id.read().await.clone();
        let locality = Locality::new(country.name, city);
        *self.state.locality.write().await = Some(locality.clone());
        *self.state.category.write().await = None;
        *self.state.message.write().await = Some(format!("Starting discovery in {}", locality));
        self.state.leads.write().await.clear();

        tracing::info!(
            target: "run_loop",
            "Run {} started for {} with {} categories",
            run_id,
            locality,
            categories.len()
        );

        let run = RunContext {
            state: self.state.clone(),
            settings: self.settings.clone(),
            notifier: self.notifier.clone(),
            generation,
            run_id,
            locality,
            max_session: request.long_running.then_some(self.settings.max_session),
            notifications_dropped: AtomicUsize::new(0),
        };
        let pipeline = self.pipeline.clone();
        let guard = RunGuard {
            state: self.state.clone(),
            generation,
        };

        Ok(tokio::spawn(async move {
            let _guard = guard;
            let mut pipeline = pipeline.lock().await;
            run.execute(&mut pipeline, categories).await
        }))
    }

    /// Requests a cooperative stop. Returns whether a run was signalled.
    pub(crate) async fn stop(&self) -> bool {
        if !self.state.is_running.load(Ordering::SeqCst) {
            return false;
        }
        self.state.should_stop.store(true, Ordering::SeqCst);
        self.state.is_running.store(false, Ordering::SeqCst);
        self.state.stop_signal.notify_waiters();
        *self.state.message.write().await = Some("Stop requested".to_string());
        tracing::info!(target: "run_loop", "Stop requested for run {}", self.state.run_id.read().await);
        true
    }

    pub(crate) async fn get_status(&self) -> RunStatus {
        let locality = self.state.locality.read().await.clone();
        RunStatus {
            is_running: self.state.is_running.load(Ordering::SeqCst),
            run_id: self.state.run_id.read().await.clone(),
            current_country: locality.as_ref().map(|l| l.country.clone()),
            current_city: locality.map(|l| l.city),
            current_category: self.state.category.read().await.clone(),
            message: self.state.message.read().await.clone(),
        }
    }

    /// Leads saved by the latest run, optionally filtered by run id.
    pub(crate) async fn leads(&self, run_id: Option<&str>) -> Vec<Lead> {
        self.state
            .leads
            .read()
            .await
            .iter()
            .filter(|lead| run_id.is_none_or(|id| lead.run_id == id))
            .cloned()
            .collect()
    }

    pub(crate) fn default_categories(&self) -> &[String] {
        &self.settings.default_categories
    }

    pub(crate) async fn stats(&self) -> LeadStats {
        LeadStats::from_leads(&self.state.leads.read().await)
    }
}

/// Everything one worker needs besides the pipeline.
struct RunContext {
    state: Arc<RunState>,
    settings: Arc<RunSettings>,
    notifier: Option<mpsc::Sender<Lead>>,
    generation: u64,
    run_id: String,
    locality: Locality,
    max_session: Option<Duration>,
    notifications_dropped: AtomicUsize,
}

impl RunContext {
    fn is_current(&self) -> bool {
        self.state.generation.load(Ordering::SeqCst) == self.generation
    }

    fn stop_requested(&self) -> bool {
        self.state.should_stop.load(Ordering::SeqCst) || !self.is_current()
    }

    async fn set_message(&self, message: String) {
        if self.is_current() {
            *self.state.message.write().await = Some(message);
        }
    }

    async fn set_category(&self, category: Option<String>) {
        if self.is_current() {
            *self.state.category.write().await = category;
        }
    }

    /// Sleeps for the paced delay, waking early on stop.
    async fn pause(&self, base: Duration) {
        let delay = pacing_delay(base, self.settings.pacing_jitter);
        if delay.is_zero() {
            return;
        }
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = self.state.stop_signal.notified() => {}
        }
    }

    async fn execute(self, pipeline: &mut Pipeline, categories: Vec<String>) -> RunSummary {
        let started = Instant::now();
        let total = categories.len();
        let mut summary = RunSummary {
            run_id: self.run_id.clone(),
            categories_processed: 0,
            leads_saved: 0,
            notifications_dropped: 0,
            outcome: RunOutcome::Completed,
        };

        for (idx, category) in categories.iter().enumerate() {
            if self.stop_requested() {
                summary.outcome = RunOutcome::Stopped;
                break;
            }
            if self.max_session.is_some_and(|limit| started.elapsed() >= limit) {
                tracing::info!(target: "run_loop", "Run {} reached its session limit", self.run_id);
                summary.outcome = RunOutcome::TimeLimitReached;
                break;
            }

            self.set_category(Some(category.clone())).await;
            self.set_message(format!(
                "Processing '{}' ({}/{}) in {}",
                category,
                idx + 1,
                total,
                self.locality
            ))
            .await;

            match self.process_category(pipeline, category).await {
                Ok(saved) => {
                    tracing::info!(target: "run_loop", "Category '{}' done: {} leads saved", category, saved);
                    summary.leads_saved += saved;
                }
                Err(e) => {
                    tracing::error!(target: "run_loop", "Category '{}' failed: {}", category, e);
                }
            }
            summary.categories_processed += 1;

            if idx + 1 < total && !self.stop_requested() {
                self.pause(self.settings.delay_between_searches).await;
            }
        }

        summary.notifications_dropped = self.notifications_dropped.load(Ordering::SeqCst);
        if summary.outcome == RunOutcome::Completed && self.stop_requested() {
            summary.outcome = RunOutcome::Stopped;
        }

        self.set_category(None).await;
        self.set_message(format!(
            "Run {} finished ({:?}): {} leads from {} categories",
            summary.run_id, summary.outcome, summary.leads_saved, summary.categories_processed
        ))
        .await;
        if self.is_current() {
            self.state.is_running.store(false, Ordering::SeqCst);
        }
        tracing::info!(
            target: "run_loop",
            "Run {} finished ({:?}) after {:.2?}: {} leads",
            summary.run_id,
            summary.outcome,
            started.elapsed(),
            summary.leads_saved
        );
        summary
    }

    async fn process_category(&self, pipeline: &mut Pipeline, category: &str) -> Result<usize> {
        let candidates = pipeline
            .acquisition
            .acquire(category, &self.locality, self.settings.max_results_per_category)
            .await;
        if candidates.is_empty() {
            return Ok(0);
        }

        let key = pipeline.router.destination_key(&self.locality);
        let partition = pipeline.router.resolve_and_ensure(&key).await?;

        let total = candidates.len();
        let mut saved = 0;
        for (idx, candidate) in candidates.into_iter().enumerate() {
            if self.stop_requested() {
                break;
            }

            let name = candidate.name.clone();
            match self.process_candidate(pipeline, &partition, category, candidate).await {
                Ok(Some(lead)) => {
                    saved += 1;
                    self.publish(lead).await;
                }
                Ok(None) => {}
                Err(e) if e.is_persistence() => {
                    tracing::warn!(target: "run_loop", "Could not save '{}': {}", name, e);
                }
                Err(e) => return Err(e),
            }

            if idx + 1 < total && !self.stop_requested() {
                self.pause(self.settings.delay_between_requests).await;
            }
        }
        Ok(saved)
    }

    /// `Ok(None)` when the candidate is already in the partition.
    async fn process_candidate(
        &self,
        pipeline: &mut Pipeline,
        partition: &PartitionHandle,
        category: &str,
        mut candidate: Candidate,
    ) -> Result<Option<Lead>> {
        if pipeline
            .guard
            .is_duplicate(Some(candidate.phone.as_str()), Some(candidate.website.as_str()), partition)
            .await
        {
            tracing::info!(target: "run_loop", "Skipping duplicate '{}'", candidate.name);
            return Ok(None);
        }

        let signals = pipeline.analyzer.analyze(&candidate.website).await;
        if candidate.email.trim().is_empty() {
            if let Some(email) = &signals.contact_email {
                candidate.email = email.clone();
            }
        }

        let input = ScoreInput::for_candidate(&candidate, &signals);
        let lead_score = pipeline.scorer.score(&input);
        let value_justification = pipeline.scorer.justify(&input, category);

        let lead = Lead {
            country: self.locality.country.clone(),
            city: self.locality.city.clone(),
            category: category.to_string(),
            business_name: candidate.name,
            phone: candidate.phone,
            email: candidate.email,
            website: candidate.website,
            address: candidate.address,
            rating: candidate.rating,
            review_count: candidate.review_count,
            lead_score,
            value_justification,
            run_id: self.run_id.clone(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            website_signals: signals,
        };

        pipeline.router.append(partition, &lead).await?;
        pipeline
            .guard
            .record(Some(lead.phone.as_str()), Some(lead.website.as_str()), partition);
        tracing::info!(
            target: "run_loop",
            "Saved '{}' (score {})",
            lead.business_name,
            lead.lead_score
        );
        Ok(Some(lead))
    }

    async fn publish(&self, lead: Lead) {
        if let Some(notifier) = &self.notifier {
            match notifier
                .send_timeout(lead.clone(), self.settings.notify_timeout)
                .await
            {
                Ok(()) => {}
                Err(SendTimeoutError::Timeout(_)) => {
                    self.notifications_dropped.fetch_add(1, Ordering::SeqCst);
                    tracing::warn!(target: "run_loop", "Lead channel stayed full; dropped notification for '{}'", lead.business_name);
                }
                Err(SendTimeoutError::Closed(_)) => {
                    self.notifications_dropped.fetch_add(1, Ordering::SeqCst);
                    tracing::debug!(target: "run_loop", "Lead channel closed");
                }
            }
        }
        if self.is_current() {
            self.state.leads.write().await.push(lead);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::{BusinessSource, ExclusionFilter};
    use crate::fetch::{FetchedPage, HtmlFetcher};
    use crate::router::{LEAD_HEADERS, PHONE_COLUMN};
    use crate::scorer::ScoreWeights;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use url::Url;

    /// Returns one candidate per category (phone = category) unless a fixed list is set.
    struct FakeSource {
        fixed: Option<Vec<Candidate>>,
        acquired: std::sync::Mutex<Vec<String>>,
    }

    impl FakeSource {
        fn per_category() -> Arc<Self> {
            Arc::new(Self {
                fixed: None,
                acquired: std::sync::Mutex::new(Vec::new()),
            })
        }

        fn fixed(candidates: Vec<Candidate>) -> Arc<Self> {
            Arc::new(Self {
                fixed: Some(candidates),
                acquired: std::sync::Mutex::new(Vec::new()),
            })
        }

        fn acquired(&self) -> Vec<String> {
            self.acquired.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl BusinessSource for FakeSource {
        fn name(&self) -> &'static str {
            "fake"
        }

        async fn search(&self, category: &str, _: &Locality, _: usize) -> Result<Vec<Candidate>> {
            self.acquired.lock().unwrap().push(category.to_string());
            Ok(self.fixed.clone().unwrap_or_else(|| {
                vec![Candidate {
                    name: format!("{} business", category),
                    phone: category.to_string(),
                    ..Candidate::default()
                }]
            }))
        }
    }

    struct OfflineFetcher;

    #[async_trait]
    impl HtmlFetcher for OfflineFetcher {
        async fn fetch(&self, _: &Url) -> Result<FetchedPage> {
            Err(AppError::Task("offline".to_string()))
        }
    }

    fn settings(delay_between_searches: Duration) -> RunSettings {
        RunSettings {
            max_results_per_category: 10,
            delay_between_requests: Duration::ZERO,
            delay_between_searches,
            pacing_jitter: Duration::ZERO,
            max_session: Duration::from_secs(3600),
            default_categories: vec!["gym".to_string()],
            notify_timeout: Duration::from_secs(1),
        }
    }

    fn controller(
        source: Option<Arc<FakeSource>>,
        store: Arc<MemoryStore>,
        settings: RunSettings,
    ) -> RunController {
        let acquisition = AcquisitionStrategy::new(
            source.map(|s| s as Arc<dyn BusinessSource>),
            None,
            ExclusionFilter::default(),
        );
        let pipeline = Pipeline::new(
            acquisition,
            WebsiteAnalyzer::new(Arc::new(OfflineFetcher)),
            LeadScorer::new(ScoreWeights {
                has_phone: 10,
                ..ScoreWeights::default()
            }),
            store,
            PartitionGranularity::Country,
        );
        RunController::new(pipeline, settings)
    }

    fn request(categories: &[&str]) -> StartRequest {
        StartRequest {
            country: "india".to_string(),
            city: "Mumbai".to_string(),
            categories: Some(categories.iter().map(|c| c.to_string()).collect()),
            long_running: false,
        }
    }

    async fn finish(handle: JoinHandle<RunSummary>) -> RunSummary {
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("run did not finish")
            .expect("run task panicked")
    }

    #[tokio::test]
    async fn test_run_completes_and_reports() {
        let source = FakeSource::per_category();
        let store = Arc::new(MemoryStore::new());
        let controller = controller(Some(source.clone()), store.clone(), settings(Duration::ZERO));

        let handle = controller.start(request(&["gym", "bakery"])).await.unwrap();
        let summary = finish(handle).await;

        assert_eq!(summary.outcome, RunOutcome::Completed);
        assert_eq!(summary.categories_processed, 2);
        assert_eq!(summary.leads_saved, 2);
        assert_eq!(source.acquired(), vec!["gym", "bakery"]);

        let status = controller.get_status().await;
        assert!(!status.is_running);
        assert_eq!(status.run_id, summary.run_id);
        assert_eq!(status.run_id.len(), 8);
        assert_eq!(status.current_country.as_deref(), Some("India"));
        assert_eq!(status.current_category, None);

        let rows = store.rows("India").await;
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0][0], LEAD_HEADERS[0]);
        assert_eq!(rows[1][PHONE_COLUMN], "gym");

        let leads = controller.leads(Some(&summary.run_id)).await;
        assert_eq!(leads.len(), 2);
        assert!(controller.leads(Some("other")).await.is_empty());
        let stats = controller.stats().await;
        assert_eq!(stats.total_leads, 2);
        assert_eq!(stats.by_country.get("India"), Some(&2));
    }

    #[tokio::test]
    async fn test_run_id_is_stable_across_runs() {
        let controller = controller(
            Some(FakeSource::per_category()),
            Arc::new(MemoryStore::new()),
            settings(Duration::ZERO),
        );
        let before = controller.get_status().await.run_id;
        assert_eq!(before.len(), 8);

        let first = finish(controller.start(request(&["gym"])).await.unwrap()).await;
        let second = finish(controller.start(request(&["spa"])).await.unwrap()).await;
        assert_eq!(first.run_id, before);
        assert_eq!(second.run_id, before);

        let leads = controller.leads(None).await;
        assert_eq!(leads.len(), 1);
        assert_eq!(leads[0].category, "spa");
    }

    #[tokio::test]
    async fn test_start_while_running_is_rejected() {
        let source = FakeSource::per_category();
        let controller = controller(
            Some(source),
            Arc::new(MemoryStore::new()),
            settings(Duration::from_millis(500)),
        );

        let handle = controller.start(request(&["gym", "bakery"])).await.unwrap();
        let first_id = controller.get_status().await.run_id;

        match controller.start(request(&["spa"])).await {
            Err(AppError::AlreadyRunning(id)) => assert_eq!(id, first_id),
            other => panic!("expected rejection, got {:?}", other.map(|_| ())),
        }
        let status = controller.get_status().await;
        assert!(status.is_running);
        assert_eq!(status.run_id, first_id);

        assert!(controller.stop().await);
        finish(handle).await;
    }

    #[tokio::test]
    async fn test_stop_when_idle_is_noop() {
        let controller = controller(
            Some(FakeSource::per_category()),
            Arc::new(MemoryStore::new()),
            settings(Duration::ZERO),
        );
        assert!(!controller.stop().await);
        assert!(!controller.stop().await);
        assert!(!controller.get_status().await.is_running);
    }

    #[tokio::test]
    async fn test_stop_after_first_category() {
        let source = FakeSource::per_category();
        let (tx, mut rx) = mpsc::channel(8);
        let controller = controller(
            Some(source.clone()),
            Arc::new(MemoryStore::new()),
            settings(Duration::from_millis(300)),
        )
        .with_notifier(tx);

        let handle = controller
            .start(request(&["gym", "bakery", "spa"]))
            .await
            .unwrap();
        let first = rx.recv().await.unwrap();
        assert_eq!(first.category, "gym");
        controller.stop().await;

        let summary = finish(handle).await;
        assert_eq!(summary.outcome, RunOutcome::Stopped);
        assert_eq!(summary.categories_processed, 1);
        assert_eq!(source.acquired(), vec!["gym"]);
        assert!(!controller.get_status().await.is_running);
    }

    #[tokio::test]
    async fn test_duplicate_is_skipped() {
        let store = Arc::new(MemoryStore::new());
        store.create_partition("India").await.unwrap();
        store
            .append_row("India", LEAD_HEADERS.iter().map(|h| h.to_string()).collect())
            .await
            .unwrap();
        let mut existing = vec![String::new(); LEAD_HEADERS.len()];
        existing[PHONE_COLUMN] = "022 111".to_string();
        store.append_row("India", existing).await.unwrap();

        let source = FakeSource::fixed(vec![
            Candidate {
                name: "Old Gym".to_string(),
                phone: "022 111".to_string(),
                ..Candidate::default()
            },
            Candidate {
                name: "New Gym".to_string(),
                phone: "022 222".to_string(),
                ..Candidate::default()
            },
        ]);
        let (tx, mut rx) = mpsc::channel(8);
        let controller =
            controller(Some(source), store.clone(), settings(Duration::ZERO)).with_notifier(tx);

        let summary = finish(controller.start(request(&["gym"])).await.unwrap()).await;

        assert_eq!(summary.leads_saved, 1);
        assert_eq!(store.append_count(), 3);
        let lead = rx.try_recv().unwrap();
        assert_eq!(lead.business_name, "New Gym");
        assert_eq!(lead.lead_score, 10);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_unsupported_country_is_rejected() {
        let controller = controller(
            Some(FakeSource::per_category()),
            Arc::new(MemoryStore::new()),
            settings(Duration::ZERO),
        );
        let mut req = request(&["gym"]);
        req.country = "Atlantis".to_string();

        assert!(matches!(
            controller.start(req).await,
            Err(AppError::UnsupportedCountry(_))
        ));
        assert!(!controller.get_status().await.is_running);
    }

    #[tokio::test]
    async fn test_missing_source_is_rejected() {
        let controller = controller(None, Arc::new(MemoryStore::new()), settings(Duration::ZERO));
        assert!(matches!(
            controller.start(request(&["gym"])).await,
            Err(AppError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_categories_use_defaults() {
        let source = FakeSource::per_category();
        let controller = controller(
            Some(source.clone()),
            Arc::new(MemoryStore::new()),
            settings(Duration::ZERO),
        );
        finish(controller.start(request(&[" "])).await.unwrap()).await;
        assert_eq!(source.acquired(), vec!["gym"]);
    }

    #[tokio::test]
    async fn test_session_limit_ends_long_running_run() {
        let source = FakeSource::per_category();
        let mut run_settings = settings(Duration::ZERO);
        run_settings.max_session = Duration::ZERO;
        let controller = controller(Some(source.clone()), Arc::new(MemoryStore::new()), run_settings);

        let mut req = request(&["gym", "spa"]);
        req.long_running = true;
        let summary = finish(controller.start(req).await.unwrap()).await;

        assert_eq!(summary.outcome, RunOutcome::TimeLimitReached);
        assert_eq!(summary.categories_processed, 0);
        assert!(source.acquired().is_empty());
    }

    #[tokio::test]
    async fn test_slow_consumer_gets_every_notification_or_a_drop_count() {
        let source = FakeSource::fixed(vec![
            Candidate {
                name: "Iron Gym".to_string(),
                phone: "022 1".to_string(),
                ..Candidate::default()
            },
            Candidate {
                name: "Steel Gym".to_string(),
                phone: "022 2".to_string(),
                ..Candidate::default()
            },
        ]);
        let mut run_settings = settings(Duration::ZERO);
        run_settings.notify_timeout = Duration::from_millis(20);
        let (tx, mut rx) = mpsc::channel(1);
        let controller =
            controller(Some(source), Arc::new(MemoryStore::new()), run_settings).with_notifier(tx);

        let summary = finish(controller.start(request(&["gym"])).await.unwrap()).await;

        assert_eq!(summary.leads_saved, 2);
        assert_eq!(summary.notifications_dropped, 1);
        assert_eq!(rx.try_recv().unwrap().business_name, "Iron Gym");
        assert_eq!(controller.leads(None).await.len(), 2);
    }

    #[tokio::test]
    async fn test_waiting_consumer_receives_every_lead() {
        let source = FakeSource::fixed(vec![
            Candidate {
                name: "Iron Gym".to_string(),
                phone: "022 1".to_string(),
                ..Candidate::default()
            },
            Candidate {
                name: "Steel Gym".to_string(),
                phone: "022 2".to_string(),
                ..Candidate::default()
            },
        ]);
        let (tx, mut rx) = mpsc::channel(1);
        let controller =
            controller(Some(source), Arc::new(MemoryStore::new()), settings(Duration::ZERO))
                .with_notifier(tx);

        let handle = controller.start(request(&["gym"])).await.unwrap();
        let mut names = Vec::new();
        while names.len() < 2 {
            names.push(rx.recv().await.unwrap().business_name);
        }
        let summary = finish(handle).await;

        assert_eq!(names, vec!["Iron Gym", "Steel Gym"]);
        assert_eq!(summary.notifications_dropped, 0);
    }

    #[tokio::test]
    async fn test_oversized_weights_do_not_end_the_run() {
        let acquisition = AcquisitionStrategy::new(
            Some(FakeSource::per_category() as Arc<dyn BusinessSource>),
            None,
            ExclusionFilter::default(),
        );
        let pipeline = Pipeline::new(
            acquisition,
            WebsiteAnalyzer::new(Arc::new(OfflineFetcher)),
            LeadScorer::new(ScoreWeights {
                has_phone: u32::MAX,
                no_https: u32::MAX,
                weak_website: 10,
                ..ScoreWeights::default()
            }),
            Arc::new(MemoryStore::new()),
            PartitionGranularity::Country,
        );
        let controller = RunController::new(pipeline, settings(Duration::ZERO));

        let summary = finish(controller.start(request(&["gym", "spa"])).await.unwrap()).await;

        assert_eq!(summary.outcome, RunOutcome::Completed);
        assert_eq!(summary.leads_saved, 2);
        assert!(controller.leads(None).await.iter().all(|l| l.lead_score == 150));
    }
}
