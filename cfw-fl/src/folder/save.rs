//! Autosave coordination
//!
//! One `SaveSession` exists per open (folder, section) editing context. The
//! session owns a small state machine (`Idle → Scheduled → Saving → Idle`)
//! run by a spawned coordinator task; callers talk to it over a command
//! channel. Because the coordinator performs the persistence write inline in
//! its own loop, at most one save is ever in flight per session, and
//! triggers that arrive mid-save are processed only after the in-flight
//! write completes.
//!
//! Trigger semantics:
//! - `buffer` (content change): re-arms the debounce window; only the most
//!   recently buffered content is ever written.
//! - `flush` (explicit trigger, e.g. "Next"): cancels the pending window,
//!   saves immediately, surfaces failure to the caller.
//! - `close` (editing context teardown): cancels the window and performs
//!   one final save of any dirty content.
//! - `hide` (tab hidden): re-arms the normal debounce window. Best-effort
//!   relaxation; a true synchronous flush is not available at that point in
//!   the client lifecycle.
//! - `notify_unload`: non-blocking notification only, no persistence
//!   guarantee.
//!
//! A failed save on the debounced path is logged and swallowed (a background
//! save must not interrupt typing); the dirty content is kept so the next
//! trigger retries it. A failed save on the explicit paths is returned to
//! the caller.

use crate::error::{Error, Result};
use async_trait::async_trait;
use cfw_common::events::{EventBus, FolderEvent};
use serde_json::Value;
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{sleep_until, Duration, Instant};
use tracing::{debug, warn};
use uuid::Uuid;

/// Persistence seam for section writes
///
/// The coordinator never touches storage directly; the lifecycle service
/// supplies a store backed by the database, and tests supply recording or
/// failing stores.
#[async_trait]
pub trait SectionStore: Send + Sync {
    /// Write one section's content blob
    async fn persist_section(&self, folder_id: Uuid, section: &str, content: &Value)
        -> Result<()>;
}

/// Coordinator phase, published on a watch channel for observability
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SavePhase {
    /// Nothing buffered, nothing scheduled
    Idle,
    /// Dirty content buffered, debounce timer armed
    Scheduled,
    /// A persistence write is in flight
    Saving,
}

/// Save counters, published on a watch channel
#[derive(Debug, Clone, Default)]
pub struct SaveStats {
    /// Completed persistence writes
    pub saves_completed: u64,
    /// Failed persistence writes
    pub saves_failed: u64,
    /// When the last successful write finished
    pub last_saved_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Autosave configuration
#[derive(Debug, Clone)]
pub struct SaveConfig {
    /// Idle window before a buffered edit is persisted
    pub debounce: Duration,
}

impl Default for SaveConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(2000),
        }
    }
}

impl SaveConfig {
    /// Load autosave configuration from database settings, falling back to
    /// defaults
    pub async fn from_database(db: &SqlitePool) -> Self {
        let mut config = Self::default();

        if let Ok(Some(ms_str)) = sqlx::query_scalar::<_, String>(
            "SELECT value FROM settings WHERE key = 'autosave_debounce_ms'",
        )
        .fetch_optional(db)
        .await
        {
            if let Ok(ms) = ms_str.parse::<u64>() {
                // Clamp to a sane range: 100ms-60s
                config.debounce = Duration::from_millis(ms.clamp(100, 60_000));
            }
        }

        config
    }
}

enum Command {
    Buffer { content: Value },
    Hide,
    Flush { reply: oneshot::Sender<Result<()>> },
    Close { reply: oneshot::Sender<Result<()>> },
    Unload,
}

/// Handle to a live save coordinator
///
/// Cheap to clone; all clones address the same coordinator task.
#[derive(Clone)]
pub struct SaveSession {
    folder_id: Uuid,
    section: String,
    tx: mpsc::Sender<Command>,
    phase_rx: watch::Receiver<SavePhase>,
    stats_rx: watch::Receiver<SaveStats>,
}

impl SaveSession {
    /// Spawn a coordinator for one (folder, section) editing context
    pub fn spawn(
        folder_id: Uuid,
        section: impl Into<String>,
        store: Arc<dyn SectionStore>,
        events: EventBus,
        config: SaveConfig,
    ) -> Self {
        let section = section.into();
        let (tx, rx) = mpsc::channel(32);
        let (phase_tx, phase_rx) = watch::channel(SavePhase::Idle);
        let (stats_tx, stats_rx) = watch::channel(SaveStats::default());

        let coordinator = Coordinator {
            folder_id,
            section: section.clone(),
            store,
            events,
            debounce: config.debounce,
            rx,
            phase_tx,
            stats_tx,
            buffered: None,
            deadline: None,
        };
        tokio::spawn(coordinator.run());

        Self {
            folder_id,
            section,
            tx,
            phase_rx,
            stats_rx,
        }
    }

    /// Folder this session belongs to
    pub fn folder_id(&self) -> Uuid {
        self.folder_id
    }

    /// Section key this session belongs to
    pub fn section(&self) -> &str {
        &self.section
    }

    /// Buffer new content and (re)arm the debounce window
    pub async fn buffer(&self, content: Value) -> Result<()> {
        self.send(Command::Buffer { content }).await
    }

    /// Tab-hide trigger: re-arm the debounce window for dirty content
    pub async fn hide(&self) -> Result<()> {
        self.send(Command::Hide).await
    }

    /// Explicit save trigger: cancel the pending window, save now, await
    /// completion. Failures are surfaced.
    pub async fn flush(&self) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Flush { reply }).await?;
        rx.await
            .map_err(|_| Error::Session("save coordinator stopped during flush".to_string()))?
    }

    /// Teardown trigger: cancel the pending window and perform one final
    /// save of any dirty content before the session is discarded. Failures
    /// are surfaced.
    pub async fn close(&self) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Close { reply }).await?;
        rx.await
            .map_err(|_| Error::Session("save coordinator stopped during close".to_string()))?
    }

    /// Best-effort unload notification: never blocks, never fails, does not
    /// guarantee persistence
    pub fn notify_unload(&self) {
        let _ = self.tx.try_send(Command::Unload);
    }

    /// Current coordinator phase
    pub fn phase(&self) -> SavePhase {
        *self.phase_rx.borrow()
    }

    /// Current save counters
    pub fn stats(&self) -> SaveStats {
        self.stats_rx.borrow().clone()
    }

    /// Wait until the coordinator has attempted at least `n` saves
    /// (completed + failed)
    pub async fn wait_for_save_attempts(&self, n: u64) {
        let mut rx = self.stats_rx.clone();
        loop {
            {
                let stats = rx.borrow();
                if stats.saves_completed + stats.saves_failed >= n {
                    return;
                }
            }
            if rx.changed().await.is_err() {
                return;
            }
        }
    }

    async fn send(&self, command: Command) -> Result<()> {
        self.tx
            .send(command)
            .await
            .map_err(|_| Error::Session("save coordinator stopped".to_string()))
    }
}

struct Coordinator {
    folder_id: Uuid,
    section: String,
    store: Arc<dyn SectionStore>,
    events: EventBus,
    debounce: Duration,
    rx: mpsc::Receiver<Command>,
    phase_tx: watch::Sender<SavePhase>,
    stats_tx: watch::Sender<SaveStats>,
    /// Most recently buffered content; `None` when clean
    buffered: Option<Value>,
    /// Armed debounce deadline; `None` when no save is scheduled
    deadline: Option<Instant>,
}

impl Coordinator {
    async fn run(mut self) {
        loop {
            // The sleep target is only polled when a deadline is armed; the
            // placeholder keeps the expression valid when it is not.
            let wake = self
                .deadline
                .unwrap_or_else(|| Instant::now() + Duration::from_secs(86_400));

            tokio::select! {
                command = self.rx.recv() => match command {
                    Some(Command::Buffer { content }) => {
                        self.buffered = Some(content);
                        self.deadline = Some(Instant::now() + self.debounce);
                        self.set_phase(SavePhase::Scheduled);
                    }
                    Some(Command::Hide) => {
                        // Re-arm the normal debounce path; nothing to do if
                        // the session is clean
                        if self.buffered.is_some() {
                            self.deadline = Some(Instant::now() + self.debounce);
                            self.set_phase(SavePhase::Scheduled);
                        }
                    }
                    Some(Command::Flush { reply }) => {
                        self.deadline = None;
                        let result = self.save_buffered().await;
                        let _ = reply.send(result);
                    }
                    Some(Command::Close { reply }) => {
                        self.deadline = None;
                        let result = self.save_buffered().await;
                        let _ = reply.send(result);
                        break;
                    }
                    Some(Command::Unload) => {
                        debug!(
                            folder_id = %self.folder_id,
                            section = %self.section,
                            "client unloading; no persistence guarantee"
                        );
                        self.events.emit_lossy(FolderEvent::ClientUnloading {
                            folder_id: self.folder_id,
                            section: self.section.clone(),
                            timestamp: chrono::Utc::now(),
                        });
                    }
                    None => {
                        // All handles dropped without close: one final
                        // best-effort save of dirty content
                        self.deadline = None;
                        if let Err(e) = self.save_buffered().await {
                            warn!(
                                folder_id = %self.folder_id,
                                section = %self.section,
                                "final save on session drop failed: {}", e
                            );
                        }
                        break;
                    }
                },
                _ = sleep_until(wake), if self.deadline.is_some() => {
                    self.deadline = None;
                    // Debounced path: a background save failing must not
                    // interrupt typing. Log, emit, keep the content dirty.
                    if let Err(e) = self.save_buffered().await {
                        warn!(
                            folder_id = %self.folder_id,
                            section = %self.section,
                            "background save failed: {}", e
                        );
                        self.events.emit_lossy(FolderEvent::SectionSaveFailed {
                            folder_id: self.folder_id,
                            section: self.section.clone(),
                            error: e.to_string(),
                            timestamp: chrono::Utc::now(),
                        });
                    }
                }
            }
        }
    }

    /// Persist the buffered content, if any
    ///
    /// Runs inline in the coordinator loop; commands arriving while the
    /// write is in flight queue in the mailbox until it completes, which is
    /// what guarantees at-most-one-in-flight.
    async fn save_buffered(&mut self) -> Result<()> {
        let Some(content) = self.buffered.take() else {
            self.set_phase(SavePhase::Idle);
            return Ok(());
        };

        self.set_phase(SavePhase::Saving);
        let result = self
            .store
            .persist_section(self.folder_id, &self.section, &content)
            .await;

        match &result {
            Ok(()) => {
                let now = chrono::Utc::now();
                self.stats_tx.send_modify(|stats| {
                    stats.saves_completed += 1;
                    stats.last_saved_at = Some(now);
                });
                self.events.emit_lossy(FolderEvent::SectionSaved {
                    folder_id: self.folder_id,
                    section: self.section.clone(),
                    timestamp: now,
                });
            }
            Err(_) => {
                // Keep the content dirty so the next trigger retries it
                self.buffered = Some(content);
                self.stats_tx.send_modify(|stats| {
                    stats.saves_failed += 1;
                });
            }
        }

        self.set_phase(SavePhase::Idle);
        result
    }

    fn set_phase(&self, phase: SavePhase) {
        self.phase_tx.send_replace(phase);
    }
}
