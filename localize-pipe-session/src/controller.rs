//! Operation controller: one scan, translate, write, delete or add-language
//! operation at a time over a shared state snapshot.
//!
//! Every request returns immediately. Work runs on the tokio runtime the
//! controller was created in; file I/O runs on the blocking pool. Callers
//! observe progress through [`OperationController::state`] or a listener and
//! can await [`OperationController::wait_until_idle`].
//!
//! # Example
//!
//! ```ignore
//! let controller = OperationController::new(scanner, settings, Arc::new(FixedScope::default()));
//! controller.rescan_now();
//! controller.wait_until_idle().await;
//! controller.translate_pending();
//! controller.wait_until_idle().await;
//! println!("{:?}", controller.state().last_message);
//! ```

use crate::providers::{ScopeResolver, SettingsProvider};
use crate::state::{
    ControllerState, UiOperation, merge_rescanned_rows, replace_rows_by_id, should_trigger_rescan,
};
use localize_pipe::writer::{self, apply_rows, create_locale_files};
use localize_pipe::{
    ApplyResult, CancellationToken, Cancelled, LanguageAddTarget, RowStatus, ScanOptions,
    ScanScope, StringEntryRow, StringsXmlScanner, TranslationDeleteTarget, canonical_locale_tag,
    locale_tag_to_qualifier,
};
use localize_pipe_mt::TranslationOrchestrator;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::{Notify, mpsc, oneshot};
use tokio::task::JoinError;
use tracing::{debug, info, warn};

pub type ListenerId = u64;

type Listener = Arc<dyn Fn(&ControllerState) + Send + Sync>;

enum NotifierEvent {
    Snapshot(Arc<ControllerState>),
    Flush(oneshot::Sender<()>),
}

/// Rescan delays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerTimings {
    /// Quiet period before a triggered rescan runs
    pub debounce: Duration,
    /// Delay for queued rescans and rescans after a write
    pub follow_up: Duration,
}

impl Default for ControllerTimings {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(700),
            follow_up: Duration::from_millis(100),
        }
    }
}

/// Mutable bookkeeping guarded by a single lock
struct Shared {
    snapshot: Arc<ControllerState>,
    token: Option<CancellationToken>,
    pending_rescan: bool,
    /// Generation of the live rescan timer, if any
    rescan_timer: Option<u64>,
    timer_generation: u64,
    requested_locales: Vec<String>,
}

struct Inner {
    scanner: StringsXmlScanner,
    settings: Arc<dyn SettingsProvider>,
    scope: Arc<dyn ScopeResolver>,
    timings: ControllerTimings,
    runtime: Handle,
    shared: Mutex<Shared>,
    notifier: mpsc::UnboundedSender<NotifierEvent>,
    listeners: Arc<Mutex<Vec<(ListenerId, Listener)>>>,
    next_listener_id: Mutex<ListenerId>,
    idle: Notify,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle to the controller; clones share the same state
#[derive(Clone)]
pub struct OperationController {
    inner: Arc<Inner>,
}

impl OperationController {
    /// Create a controller with the default rescan timings
    ///
    /// # Panics
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(
        scanner: StringsXmlScanner,
        settings: Arc<dyn SettingsProvider>,
        scope: Arc<dyn ScopeResolver>,
    ) -> Self {
        Self::with_timings(scanner, settings, scope, ControllerTimings::default())
    }

    pub fn with_timings(
        scanner: StringsXmlScanner,
        settings: Arc<dyn SettingsProvider>,
        scope: Arc<dyn ScopeResolver>,
        timings: ControllerTimings,
    ) -> Self {
        let runtime = Handle::current();
        let scan_settings = settings.scan_settings();
        let initial = ControllerState {
            include_android_resources: scan_settings.include_android_resources,
            include_compose_resources: scan_settings.include_compose_resources,
            ..ControllerState::default()
        };

        let (notifier, mut receiver) = mpsc::unbounded_channel::<NotifierEvent>();
        let listeners: Arc<Mutex<Vec<(ListenerId, Listener)>>> = Arc::new(Mutex::new(Vec::new()));
        let notifier_listeners = listeners.clone();
        runtime.spawn(async move {
            while let Some(event) = receiver.recv().await {
                let snapshot = match event {
                    NotifierEvent::Snapshot(snapshot) => snapshot,
                    NotifierEvent::Flush(done) => {
                        let _ = done.send(());
                        continue;
                    }
                };
                let current: Vec<Listener> = lock(&notifier_listeners)
                    .iter()
                    .map(|(_, listener)| listener.clone())
                    .collect();
                for listener in current {
                    listener(&snapshot);
                }
            }
        });

        Self {
            inner: Arc::new(Inner {
                scanner,
                settings,
                scope,
                timings,
                runtime,
                shared: Mutex::new(Shared {
                    snapshot: Arc::new(initial),
                    token: None,
                    pending_rescan: false,
                    rescan_timer: None,
                    timer_generation: 0,
                    requested_locales: Vec::new(),
                }),
                notifier,
                listeners,
                next_listener_id: Mutex::new(0),
                idle: Notify::new(),
            }),
        }
    }

    /// Current snapshot
    pub fn state(&self) -> Arc<ControllerState> {
        lock(&self.inner.shared).snapshot.clone()
    }

    /// Register a listener called with every new snapshot
    ///
    /// Listeners run on a notifier task, never while the state lock is held,
    /// so they may call back into the controller.
    pub fn subscribe(&self, listener: impl Fn(&ControllerState) + Send + Sync + 'static) -> ListenerId {
        let id = {
            let mut next = lock(&self.inner.next_listener_id);
            *next += 1;
            *next
        };
        let listener: Listener = Arc::new(listener);
        lock(&self.inner.listeners).push((id, listener));
        id
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = lock(&self.inner.listeners);
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        listeners.len() != before
    }

    /// Locale tags to diff even where no locale file exists yet
    pub fn set_requested_locales(&self, locale_tags: Vec<String>) {
        lock(&self.inner.shared).requested_locales = locale_tags;
    }

    /// Start a scan now, or queue one if another operation is running
    pub fn rescan_now(&self) {
        self.inner.request_rescan(None);
    }

    /// Debounced rescan; each call restarts the timer
    pub fn schedule_rescan(&self) {
        let mut shared = lock(&self.inner.shared);
        self.inner.schedule_locked(&mut shared, self.inner.timings.debounce);
    }

    /// File watcher hook
    pub fn on_resources_changed<S: AsRef<str>>(&self, paths: &[S]) {
        if paths.iter().any(|path| should_trigger_rescan(path.as_ref())) {
            debug!("Resource change detected, scheduling rescan");
            self.schedule_rescan();
        }
    }

    pub fn select_row(&self, row_id: impl Into<String>) {
        let row_id = row_id.into();
        self.inner.mutate(|state| state.selected_row_id = Some(row_id));
    }

    pub fn toggle_scope(&self) {
        self.change_scan_filters(|state| state.scan_scope = state.scan_scope.toggled());
    }

    pub fn set_scan_scope(&self, scope: ScanScope) {
        self.change_scan_filters(|state| state.scan_scope = scope);
    }

    pub fn set_resource_kinds(&self, include_android: bool, include_compose: bool) {
        self.change_scan_filters(|state| {
            state.include_android_resources = include_android;
            state.include_compose_resources = include_compose;
        });
    }

    fn change_scan_filters(&self, change: impl FnOnce(&mut ControllerState)) {
        let inner = &self.inner;
        let mut shared = lock(&inner.shared);
        if shared.snapshot.is_busy {
            let operation = shared.snapshot.active_operation.display_name().to_lowercase();
            inner.update(&mut shared, |state| {
                state.last_message = Some(format!(
                    "Wait for {} to finish before changing scope",
                    operation
                ));
            });
            return;
        }
        inner.update(&mut shared, change);
        inner.schedule_locked(&mut shared, inner.timings.debounce);
    }

    /// Request cancellation of the running operation
    ///
    /// Also drops any scheduled or queued rescan. No-op when idle.
    pub fn cancel_current_operation(&self) {
        let inner = &self.inner;
        {
            let mut shared = lock(&inner.shared);
            if !shared.snapshot.is_busy {
                return;
            }
            if let Some(token) = &shared.token {
                token.cancel();
            }
            shared.rescan_timer = None;
            shared.pending_rescan = false;
            let operation = shared.snapshot.active_operation.display_name().to_lowercase();
            info!("Cancellation requested for {}", operation);
            inner.update(&mut shared, |state| {
                state.last_message = Some(format!("Cancellation requested for {}", operation));
            });
        }
        inner.idle.notify_waiters();
    }

    /// Translate MISSING and IDENTICAL rows, then write every writable row
    ///
    /// When nothing needs translation, rows that already carry a proposal
    /// are written directly.
    pub fn translate_pending(&self) {
        let inner = &self.inner;
        let mut shared = lock(&inner.shared);
        if shared.snapshot.is_busy {
            debug!("Translate ignored because another operation is in progress");
            inner.update(&mut shared, |state| {
                state.last_message = Some("Translation already in progress".to_string());
            });
            return;
        }

        let rows_to_translate: Vec<StringEntryRow> = shared
            .snapshot
            .rows
            .iter()
            .filter(|row| row.status.needs_translation())
            .cloned()
            .collect();
        let rows_to_write: Vec<StringEntryRow> = shared
            .snapshot
            .rows
            .iter()
            .filter(|row| row.is_writable())
            .cloned()
            .collect();

        if rows_to_translate.is_empty() && rows_to_write.is_empty() {
            inner.update(&mut shared, |state| {
                state.last_message = Some("Nothing to translate or write".to_string());
            });
            return;
        }

        let token = CancellationToken::new();

        if rows_to_translate.is_empty() {
            let total = rows_to_write.len();
            shared.token = Some(token.clone());
            inner.update(&mut shared, |state| {
                state.begin(UiOperation::Applying, "Writing", total, format!("Writing 0 / {}", total));
            });
            drop(shared);
            info!("Write started (rows={})", total);
            let worker = inner.clone();
            inner.runtime.spawn(async move { worker.run_write_only(rows_to_write, token).await });
            return;
        }

        let orchestrator = match inner.settings.create_backend() {
            Ok(backend) => {
                TranslationOrchestrator::new(backend, inner.settings.translation_settings())
            }
            Err(e) => {
                warn!("Failed to create translation backend: {}", e);
                inner.update(&mut shared, |state| {
                    state.status_text = "Errors".to_string();
                    state.last_message = Some(format!("Translation failed: {}", e));
                });
                return;
            }
        };

        let total = rows_to_translate.len();
        shared.token = Some(token.clone());
        inner.update(&mut shared, |state| {
            state.begin(
                UiOperation::Translating,
                "Translating",
                total,
                format!("Translating 0 / {}", total),
            );
        });
        drop(shared);
        info!(
            "Translation started (rows={}, provider={}, model={})",
            total,
            orchestrator.backend().provider_name(),
            orchestrator.backend().model()
        );
        let worker = inner.clone();
        inner.runtime.spawn(async move {
            worker.run_translation(orchestrator, rows_to_translate, token).await
        });
    }

    /// Remove one key's translations from every locale file that has it
    pub fn delete_translations(&self, target: TranslationDeleteTarget) {
        let inner = &self.inner;
        let mut shared = lock(&inner.shared);
        if shared.snapshot.is_busy {
            debug!("Delete ignored because another operation is in progress");
            inner.update(&mut shared, |state| {
                state.last_message = Some("Another operation is already running".to_string());
            });
            return;
        }
        if target.locale_entries.is_empty() {
            inner.update(&mut shared, |state| {
                state.last_message = Some(format!(
                    "No translated locale entries found for key '{}'",
                    target.key
                ));
            });
            return;
        }

        let total = target.locale_entries.len();
        let token = CancellationToken::new();
        shared.token = Some(token.clone());
        inner.update(&mut shared, |state| {
            state.begin(
                UiOperation::Applying,
                "Deleting",
                total,
                format!("Deleting translations for '{}' (0 / {})", target.key, total),
            );
        });
        drop(shared);
        info!("Delete started for key='{}' (locales={})", target.key, total);
        let worker = inner.clone();
        inner.runtime.spawn(async move { worker.run_delete(target, token).await });
    }

    /// Create empty `strings.xml` files for a new locale
    ///
    /// # Arguments
    ///
    /// * `targets` - Resource roots to extend, usually from
    ///   `state().language_add_targets`
    /// * `locale_tag` - User input such as `pt_BR`; canonicalized first
    pub fn add_language(&self, targets: Vec<LanguageAddTarget>, locale_tag: &str) {
        let inner = &self.inner;
        let mut shared = lock(&inner.shared);
        let Some(tag) = canonical_locale_tag(locale_tag) else {
            inner.update(&mut shared, |state| {
                state.last_message = Some(format!("Unsupported locale tag '{}'", locale_tag.trim()));
            });
            return;
        };
        if shared.snapshot.is_busy {
            inner.update(&mut shared, |state| {
                state.last_message = Some("Another operation is already running".to_string());
            });
            return;
        }
        if targets.is_empty() {
            inner.update(&mut shared, |state| {
                state.last_message = Some(format!("No resource roots available for {}", tag));
            });
            return;
        }
        if targets.iter().all(|target| target.has_locale(&tag)) {
            inner.update(&mut shared, |state| {
                state.last_message =
                    Some(format!("{} already exists in all selected resource roots", tag));
            });
            return;
        }

        let total = targets.len();
        let token = CancellationToken::new();
        shared.token = Some(token.clone());
        inner.update(&mut shared, |state| {
            state.begin(
                UiOperation::Applying,
                "Adding language",
                total,
                format!("Adding {} to {} resource roots", tag, total),
            );
        });
        drop(shared);
        info!("Add language started (locale={}, roots={})", tag, total);
        let worker = inner.clone();
        inner.runtime.spawn(async move { worker.run_add_language(targets, tag, token).await });
    }

    /// Resolve once every snapshot published so far reached the listeners
    pub async fn flush_listeners(&self) {
        let (done, delivered) = oneshot::channel();
        if self.inner.notifier.send(NotifierEvent::Flush(done)).is_ok() {
            let _ = delivered.await;
        }
    }

    /// Resolve once no operation is running and no rescan is scheduled or queued
    pub async fn wait_until_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.inner.is_settled() {
                return;
            }
            notified.await;
        }
    }
}

impl Inner {
    /// Swap in a modified snapshot and queue it for listeners
    fn update<R>(&self, shared: &mut Shared, change: impl FnOnce(&mut ControllerState) -> R) -> R {
        let mut next = (*shared.snapshot).clone();
        let result = change(&mut next);
        let next = Arc::new(next);
        shared.snapshot = next.clone();
        // The notifier only stops when the controller is dropped
        let _ = self.notifier.send(NotifierEvent::Snapshot(next));
        result
    }

    fn mutate<R>(&self, change: impl FnOnce(&mut ControllerState) -> R) -> R {
        let mut shared = lock(&self.shared);
        self.update(&mut shared, change)
    }

    fn is_settled(&self) -> bool {
        let shared = lock(&self.shared);
        !shared.snapshot.is_busy && !shared.pending_rescan && shared.rescan_timer.is_none()
    }

    fn scan_options(&self, shared: &Shared) -> ScanOptions {
        let state = &shared.snapshot;
        let current_module_name = match state.scan_scope {
            ScanScope::CurrentModule => self.scope.current_module(),
            ScanScope::WholeProject => None,
        };
        ScanOptions {
            scope: state.scan_scope,
            include_android_resources: state.include_android_resources,
            include_compose_resources: state.include_compose_resources,
            include_identical_to_base: self.settings.scan_settings().include_identical_to_base,
            current_module_name,
            requested_locales: shared.requested_locales.clone(),
        }
    }

    fn schedule_locked(self: &Arc<Self>, shared: &mut Shared, delay: Duration) {
        shared.timer_generation += 1;
        let generation = shared.timer_generation;
        shared.rescan_timer = Some(generation);
        let inner = self.clone();
        self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            inner.request_rescan(Some(generation));
            inner.idle.notify_waiters();
        });
    }

    /// Begin a scan or queue it behind the running operation
    ///
    /// `timer` is the generation of the timer firing this request; a stale
    /// or cancelled timer does nothing.
    fn request_rescan(self: &Arc<Self>, timer: Option<u64>) {
        let mut shared = lock(&self.shared);
        if let Some(generation) = timer {
            if shared.rescan_timer != Some(generation) {
                return;
            }
            shared.rescan_timer = None;
        }

        if shared.snapshot.is_busy {
            shared.pending_rescan = true;
            debug!("Queued rescan for execution after current operation");
            let operation = shared.snapshot.active_operation.display_name().to_lowercase();
            self.update(&mut shared, |state| {
                state.last_message = Some(format!("Rescan queued while {} is running", operation));
            });
            return;
        }

        let options = self.scan_options(&shared);
        let token = CancellationToken::new();
        shared.token = Some(token.clone());
        let scope_label = options.scope.label();
        self.update(&mut shared, |state| {
            state.begin(
                UiOperation::Scanning,
                "Scanning",
                0,
                format!("Scanning resource files (scope: {})", scope_label),
            );
        });
        drop(shared);

        let worker = self.clone();
        self.runtime.spawn(async move { worker.run_scan(options, token).await });
    }

    /// Return to idle and replay a queued rescan
    fn finish(
        self: &Arc<Self>,
        rescan_after: Option<Duration>,
        change: impl FnOnce(&mut ControllerState),
    ) {
        {
            let mut shared = lock(&self.shared);
            shared.token = None;
            let queued = std::mem::take(&mut shared.pending_rescan);
            if queued {
                debug!("Running queued rescan");
            }
            let delay = rescan_after.or(queued.then_some(self.timings.follow_up));
            if let Some(delay) = delay {
                self.schedule_locked(&mut shared, delay);
            }
            self.update(&mut shared, change);
        }
        self.idle.notify_waiters();
    }

    async fn run_scan(self: Arc<Self>, options: ScanOptions, token: CancellationToken) {
        let scope_label = options.scope.label();
        info!(
            "Scan started (scope={}, android={}, compose={}, identical={}, module={:?})",
            scope_label,
            options.include_android_resources,
            options.include_compose_resources,
            options.include_identical_to_base,
            options.current_module_name
        );

        let scanner = self.scanner.clone();
        let outcome = tokio::task::spawn_blocking(move || -> Result<_, Cancelled> {
            let result = scanner.scan(&options, &token)?;
            let delete_targets = scanner.scan_deletion_targets(&options, &token)?;
            let add_targets = scanner.scan_language_add_targets(&options, &token)?;
            Ok((result, delete_targets, add_targets))
        })
        .await;

        match outcome {
            Ok(Ok((result, delete_targets, add_targets))) => {
                info!(
                    "Scan finished (rows={}, locales={}, deleteTargets={})",
                    result.rows.len(),
                    result.detected_locales.len(),
                    delete_targets.len()
                );
                self.finish(None, |state| {
                    let rows = merge_rescanned_rows(&state.rows, result.rows);
                    let selected = state
                        .selected_row_id
                        .take()
                        .filter(|id| rows.iter().any(|row| &row.id == id))
                        .or_else(|| rows.first().map(|row| row.id.clone()));
                    let message = if rows.is_empty() {
                        format!("No untranslated strings found (scope: {})", scope_label)
                    } else {
                        format!("Found {} candidate strings (scope: {})", rows.len(), scope_label)
                    };
                    state.rows = rows;
                    state.selected_row_id = selected;
                    state.delete_targets = delete_targets;
                    state.language_add_targets = add_targets;
                    state.detected_locales = result.detected_locales;
                    state.has_completed_initial_scan = true;
                    state.go_idle("Idle", message);
                });
            }
            Ok(Err(Cancelled)) => {
                info!("Scan cancelled");
                self.finish(None, |state| state.go_idle("Idle", "Scan cancelled"));
            }
            Err(e) => {
                warn!("Scan failed: {}", e);
                self.finish(None, |state| {
                    state.go_idle("Errors", format!("Scan failed (scope: {}): {}", scope_label, e));
                });
            }
        }
    }

    /// Write rows on the blocking pool, publishing progress
    async fn write_rows(
        self: &Arc<Self>,
        rows: Vec<StringEntryRow>,
        token: CancellationToken,
    ) -> Result<Result<ApplyResult, Cancelled>, JoinError> {
        let total = rows.len();
        let inner = self.clone();
        tokio::task::spawn_blocking(move || {
            apply_rows(
                &rows,
                |processed, applied| {
                    inner.mutate(|state| {
                        state.progress(
                            UiOperation::Applying,
                            "Writing",
                            processed,
                            total,
                            format!("Writing {} / {} (written {})", processed, total, applied),
                        );
                    });
                },
                &token,
            )
        })
        .await
    }

    async fn run_write_only(self: Arc<Self>, rows: Vec<StringEntryRow>, token: CancellationToken) {
        match self.write_rows(rows, token).await {
            Ok(Ok(result)) => {
                info!(
                    "Write finished (written={}, errors={})",
                    result.applied_count,
                    result.errors.len()
                );
                let follow_up = Some(self.timings.follow_up);
                self.finish(follow_up, |state| {
                    if result.errors.is_empty() {
                        state.go_idle("Idle", format!("Write complete: {} written", result.applied_count));
                    } else {
                        state.go_idle(
                            "Errors",
                            format!(
                                "Write completed with errors: {} written, {} write errors",
                                result.applied_count,
                                result.errors.len()
                            ),
                        );
                    }
                });
            }
            Ok(Err(Cancelled)) => {
                info!("Write cancelled");
                self.finish(None, |state| state.go_idle("Idle", "Write cancelled"));
            }
            Err(e) => {
                warn!("Write failed: {}", e);
                self.finish(None, |state| state.go_idle("Errors", format!("Write failed: {}", e)));
            }
        }
    }

    async fn run_translation(
        self: Arc<Self>,
        orchestrator: TranslationOrchestrator,
        rows: Vec<StringEntryRow>,
        token: CancellationToken,
    ) {
        let total = rows.len();
        let translated = orchestrator
            .translate_rows(
                &rows,
                |partial, processed| {
                    self.mutate(|state| {
                        state.rows = replace_rows_by_id(&state.rows, partial);
                        state.progress(
                            UiOperation::Translating,
                            "Translating",
                            processed,
                            total,
                            format!("Translating {} / {}", processed, total),
                        );
                    });
                },
                &token,
            )
            .await;

        let translated = match translated.and_then(|rows| token.check().map(|_| rows)) {
            Ok(rows) => rows,
            Err(Cancelled) => {
                info!("Translation cancelled");
                self.finish(None, |state| state.go_idle("Idle", "Translation cancelled"));
                return;
            }
        };

        let errors = translated
            .iter()
            .filter(|row| row.status == RowStatus::Error)
            .count();
        let rows_to_apply: Vec<StringEntryRow> = self.mutate(|state| {
            state.rows = replace_rows_by_id(&state.rows, &translated);
            state.rows.iter().filter(|row| row.is_writable()).cloned().collect()
        });

        if rows_to_apply.is_empty() {
            info!(
                "Translation completed with nothing to write (rows={}, errors={})",
                translated.len(),
                errors
            );
            self.finish(None, |state| {
                state.go_idle(
                    if errors > 0 { "Errors" } else { "Idle" },
                    format!(
                        "Translation complete: {} ok, {} errors, 0 written",
                        translated.len() - errors,
                        errors
                    ),
                );
            });
            return;
        }

        let write_total = rows_to_apply.len();
        self.mutate(|state| {
            state.progress(
                UiOperation::Applying,
                "Writing",
                0,
                write_total,
                format!("Writing 0 / {}", write_total),
            );
        });

        match self.write_rows(rows_to_apply, token).await {
            Ok(Ok(result)) => {
                let write_errors = result.errors.len();
                info!(
                    "Translation + write completed (rows={}, written={}, translationErrors={}, writeErrors={})",
                    translated.len(),
                    result.applied_count,
                    errors,
                    write_errors
                );
                let follow_up = Some(self.timings.follow_up);
                self.finish(follow_up, |state| {
                    state.go_idle(
                        if errors > 0 || write_errors > 0 { "Errors" } else { "Idle" },
                        format!(
                            "Translation + write complete: {} written, {} translation errors, {} write errors",
                            result.applied_count, errors, write_errors
                        ),
                    );
                });
            }
            Ok(Err(Cancelled)) => {
                info!("Translation cancelled");
                self.finish(None, |state| state.go_idle("Idle", "Translation cancelled"));
            }
            Err(e) => {
                warn!("Translation write failed: {}", e);
                self.finish(None, |state| {
                    state.go_idle("Errors", format!("Translation failed: {}", e));
                });
            }
        }
    }

    async fn run_delete(self: Arc<Self>, target: TranslationDeleteTarget, token: CancellationToken) {
        let key = target.key.clone();
        let total = target.locale_entries.len();
        let inner = self.clone();
        let progress_key = key.clone();
        let outcome = tokio::task::spawn_blocking(move || {
            writer::delete_translations(
                &target,
                |processed, deleted| {
                    inner.mutate(|state| {
                        state.progress(
                            UiOperation::Applying,
                            "Deleting",
                            processed,
                            total,
                            format!(
                                "Deleting translations for '{}' ({} / {}, deleted {})",
                                progress_key, processed, total, deleted
                            ),
                        );
                    });
                },
                &token,
            )
        })
        .await;

        match outcome {
            Ok(Ok(result)) => {
                info!(
                    "Delete finished for key='{}' (deleted={}, errors={})",
                    key,
                    result.applied_count,
                    result.errors.len()
                );
                let follow_up = Some(self.timings.follow_up);
                self.finish(follow_up, |state| {
                    if result.errors.is_empty() {
                        state.go_idle(
                            "Idle",
                            format!(
                                "Deleted translations for '{}' in {} locale files",
                                key, result.applied_count
                            ),
                        );
                    } else {
                        state.go_idle(
                            "Errors",
                            format!(
                                "Deleted with errors for '{}': {} deleted, {} errors",
                                key,
                                result.applied_count,
                                result.errors.len()
                            ),
                        );
                    }
                });
            }
            Ok(Err(Cancelled)) => {
                info!("Delete cancelled for key='{}'", key);
                self.finish(None, |state| state.go_idle("Idle", "Delete cancelled"));
            }
            Err(e) => {
                warn!("Delete failed for key='{}': {}", key, e);
                self.finish(None, |state| {
                    state.go_idle("Errors", format!("Delete failed for '{}': {}", key, e));
                });
            }
        }
    }

    async fn run_add_language(
        self: Arc<Self>,
        targets: Vec<LanguageAddTarget>,
        tag: String,
        token: CancellationToken,
    ) {
        let qualifier = locale_tag_to_qualifier(&tag);
        let worker_tag = tag.clone();
        let outcome = tokio::task::spawn_blocking(move || {
            create_locale_files(&targets, &worker_tag, &qualifier, &token)
        })
        .await;

        match outcome {
            Ok(Ok(result)) => {
                let created = result.created_paths.len();
                info!(
                    "Add language finished (locale={}, created={}, skipped={}, errors={})",
                    tag,
                    created,
                    result.skipped_count,
                    result.errors.len()
                );
                let follow_up = Some(self.timings.follow_up);
                self.finish(follow_up, |state| {
                    if result.errors.is_empty() {
                        state.go_idle("Idle", format!("Added {} to {} resource roots", tag, created));
                    } else {
                        state.go_idle(
                            "Errors",
                            format!(
                                "Added {} with errors: {} created, {} errors",
                                tag,
                                created,
                                result.errors.len()
                            ),
                        );
                    }
                });
            }
            Ok(Err(Cancelled)) => {
                info!("Add language cancelled");
                self.finish(None, |state| state.go_idle("Idle", "Add language cancelled"));
            }
            Err(e) => {
                warn!("Add language failed: {}", e);
                self.finish(None, |state| {
                    state.go_idle("Errors", format!("Add language failed: {}", e));
                });
            }
        }
    }
}
