use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use chrono::Local;
use sqlx::SqlitePool;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::connectivity::NetworkMonitor;
use crate::db::repository;
use crate::error::DatesError;
use crate::grouping::{group_due_dates, merge_sections};
use crate::lms::DatesApi;
use crate::models::{DueDateRecord, DueDateSection};
use crate::routing::DatesRouter;

/// Aggregated screen state, published through a watch channel. Only the
/// controller mutates it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatesState {
    pub sections: BTreeMap<DueDateSection, Vec<DueDateRecord>>,
    pub can_load_more: bool,
    pub is_loading: bool,
    pub is_refreshing: bool,
    pub is_shift_in_flight: bool,
}

/// User-facing message kinds; the rendering layer resolves localized text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiMessage {
    NoConnection,
    UnknownError,
    DueDatesShifted { courses: usize },
}

struct ControllerInner {
    db: SqlitePool,
    api: Arc<dyn DatesApi>,
    monitor: Arc<dyn NetworkMonitor>,
    router: Arc<dyn DatesRouter>,
    username: String,
    state_tx: watch::Sender<DatesState>,
    messages_tx: mpsc::UnboundedSender<UiMessage>,
    messages_rx: std::sync::Mutex<Option<mpsc::UnboundedReceiver<UiMessage>>>,
    page: AtomicU32,
    fetch_job: tokio::sync::Mutex<Option<JoinHandle<()>>>,
}

/// Drives fetch -> group -> accumulate across pages of the user's due dates,
/// with a cache fallback when the remote is unreachable.
pub struct DatesController {
    inner: Arc<ControllerInner>,
}

impl DatesController {
    pub fn new(
        db: SqlitePool,
        api: Arc<dyn DatesApi>,
        monitor: Arc<dyn NetworkMonitor>,
        router: Arc<dyn DatesRouter>,
        username: String,
    ) -> Self {
        let (state_tx, _) = watch::channel(DatesState::default());
        let (messages_tx, messages_rx) = mpsc::unbounded_channel();
        Self {
            inner: Arc::new(ControllerInner {
                db,
                api,
                monitor,
                router,
                username,
                state_tx,
                messages_tx,
                messages_rx: std::sync::Mutex::new(Some(messages_rx)),
                page: AtomicU32::new(1),
                fetch_job: tokio::sync::Mutex::new(None),
            }),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<DatesState> {
        self.inner.state_tx.subscribe()
    }

    pub fn state(&self) -> DatesState {
        self.inner.state_tx.borrow().clone()
    }

    /// Hands out the UI message stream; `None` after the first call.
    pub fn take_messages(&self) -> Option<mpsc::UnboundedReceiver<UiMessage>> {
        self.inner
            .messages_rx
            .lock()
            .ok()
            .and_then(|mut guard| guard.take())
    }

    /// Preloads the cached first page (best effort) and fetches page 1.
    pub async fn start(&self) {
        self.fetch_dates(false, true).await;
    }

    /// Fetches the next page if one exists and nothing else is in flight.
    pub async fn fetch_more(&self) {
        let allowed = {
            let state = self.inner.state_tx.borrow();
            state.can_load_more && !state.is_loading && !state.is_refreshing
        };
        if allowed {
            self.fetch_dates(false, false).await;
        }
    }

    /// Cancels any in-flight fetch and reloads from page 1.
    pub async fn refresh(&self) {
        if let Some(job) = self.inner.fetch_job.lock().await.take() {
            job.abort();
        }
        // An aborted task cannot clear its own flags.
        self.inner.state_tx.send_modify(|state| {
            state.is_loading = false;
            state.is_refreshing = false;
        });
        self.fetch_dates(true, false).await;
    }

    /// Moves all of the learner's relative deadlines forward, then refreshes.
    pub async fn shift_due_dates(&self) {
        // Check and set under one state mutation so two concurrent callers
        // cannot both pass the guard.
        let mut already_in_flight = false;
        self.inner.state_tx.send_modify(|state| {
            if state.is_shift_in_flight {
                already_in_flight = true;
            } else {
                state.is_shift_in_flight = true;
            }
        });
        if already_in_flight {
            return;
        }

        let course_ids = self.inner.relative_course_ids();
        match self.inner.api.shift_due_dates(&course_ids).await {
            Ok(()) => {
                let _ = self.inner.messages_tx.send(UiMessage::DueDatesShifted {
                    courses: course_ids.len(),
                });
                self.inner
                    .state_tx
                    .send_modify(|state| state.is_shift_in_flight = false);
                self.refresh().await;
            }
            Err(err) => {
                warn!("shift due dates failed: {}", err);
                self.inner.emit_failure(&err);
                self.inner
                    .state_tx
                    .send_modify(|state| state.is_shift_in_flight = false);
            }
        }
    }

    pub fn open_course_outline(&self, record: &DueDateRecord) {
        self.inner
            .router
            .open_course_outline(&record.course_id, &record.first_block_id);
    }

    /// Awaits the current fetch task, if any.
    pub async fn wait_for_fetch(&self) {
        let job = self.inner.fetch_job.lock().await.take();
        if let Some(job) = job {
            let _ = job.await;
        }
    }

    async fn fetch_dates(&self, refresh: bool, initial: bool) {
        if refresh {
            self.inner
                .state_tx
                .send_modify(|state| state.can_load_more = true);
            self.inner.page.store(1, Ordering::SeqCst);
        }
        // Flags flip before the task spawns so the load-more guard can never
        // race a fetch that has not started yet.
        self.inner.state_tx.send_modify(|state| {
            state.is_loading = !refresh;
            state.is_refreshing = refresh;
        });

        // Hold the slot across the spawn so nobody can observe an empty
        // slot while the task is already running.
        let mut job_slot = self.inner.fetch_job.lock().await;
        let inner = Arc::clone(&self.inner);
        *job_slot = Some(tokio::spawn(async move {
            inner.run_fetch(refresh, initial).await;
        }));
    }
}

impl ControllerInner {
    async fn run_fetch(self: Arc<Self>, refresh: bool, initial: bool) {
        if initial {
            if let Err(err) = self.preload_cached_first_page().await {
                debug!("cache preload failed: {}", err);
            }
        }

        if let Err(err) = self.fetch_current_page(refresh).await {
            self.state_tx.send_modify(|state| state.can_load_more = false);
            if let Err(cache_err) = self.apply_cache_fallback().await {
                // Leave the last-known-good sections in place.
                warn!("cache fallback failed: {}", cache_err);
            }
            self.emit_failure(&err);
        }

        self.state_tx.send_modify(|state| {
            state.is_loading = false;
            state.is_refreshing = false;
        });
    }

    async fn fetch_current_page(&self, refresh: bool) -> Result<(), DatesError> {
        let page = self.page.load(Ordering::SeqCst);

        // The cache only ever holds the head of the list, so the offline
        // short-circuit applies to the first page alone; deeper pages go to
        // the network regardless and fail there.
        if page == 1 && !self.monitor.is_online() {
            return Err(DatesError::NoConnection);
        }

        let result = self.api.fetch_page(&self.username, page).await?;

        if page == 1 {
            if let Err(err) = repository::clear_cached_dates(&self.db).await {
                warn!("failed to clear due-date cache: {}", err);
            }
        }
        if let Err(err) = repository::insert_cached_dates(&self.db, &result.records).await {
            warn!("failed to cache due dates: {}", err);
        }

        let grouped = group_due_dates(&result.records, &Local::now());
        self.state_tx.send_modify(|state| {
            if refresh || page == 1 {
                state.sections = grouped;
            } else {
                merge_sections(&mut state.sections, grouped);
            }
            state.can_load_more = result.has_more;
        });
        if result.has_more {
            self.page.fetch_add(1, Ordering::SeqCst);
        }

        Ok(())
    }

    async fn preload_cached_first_page(&self) -> Result<(), DatesError> {
        let cached = repository::fetch_first_page_cached(&self.db).await?;
        let grouped = group_due_dates(&cached, &Local::now());
        self.state_tx.send_modify(|state| {
            state.sections = grouped;
            state.can_load_more = true;
        });
        Ok(())
    }

    async fn apply_cache_fallback(&self) -> Result<(), DatesError> {
        let cached = repository::fetch_cached_dates(&self.db).await?;
        let grouped = group_due_dates(&cached, &Local::now());
        self.state_tx.send_modify(|state| {
            state.sections = grouped;
            state.can_load_more = false;
        });
        Ok(())
    }

    fn relative_course_ids(&self) -> Vec<String> {
        let state = self.state_tx.borrow();
        let ids: BTreeSet<String> = state
            .sections
            .values()
            .flatten()
            .filter(|record| record.is_relative)
            .map(|record| record.course_id.clone())
            .collect();
        ids.into_iter().collect()
    }

    fn emit_failure(&self, err: &DatesError) {
        let message = if err.is_connectivity() {
            UiMessage::NoConnection
        } else {
            UiMessage::UnknownError
        };
        let _ = self.messages_tx.send(message);
    }
}
