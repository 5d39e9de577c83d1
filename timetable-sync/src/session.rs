//! One editing session bound to a record store
//!
//! [`ScheduleSession`] owns the [`Editor`] and a [`ScheduleBackend`]. The
//! editor never talks to the backend directly: changes queue up in its outbox
//! and [`ScheduleSession::flush`] sends them, then re-fetches schedule records
//! and reconciles them with the local state.

use crate::backend::{NewScheduleItem, ScheduleBackend};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use timetable_core::{Editor, EditorConfig, ItemId, Notification, RecordingWindow};

/// A request the backend rejected
#[derive(Debug, Clone, PartialEq)]
pub struct FailedRequest {
    pub notification: Notification,
    pub error: String,
}

/// What a flush did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlushReport {
    /// Requests the backend accepted
    pub sent: usize,
    /// Queued creates whose item was removed or persisted in the meantime
    pub skipped: usize,
    pub failed: Vec<FailedRequest>,
    /// Failed requests put back in the editor queue for the next flush
    pub requeued: usize,
    /// Whether schedule records were re-fetched and reconciled
    pub refetched: bool,
}

impl FlushReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Result of a successful bulk save
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveOutcome {
    pub saved_at: DateTime<Utc>,
    /// Number of requests sent
    pub requests: usize,
}

pub struct ScheduleSession<B> {
    backend: B,
    editor: Editor,
    last_saved: Option<DateTime<Utc>>,
}

impl<B: ScheduleBackend> ScheduleSession<B> {
    /// Fetches every record of the project and seeds an editor from them
    pub async fn open(backend: B, config: EditorConfig) -> Result<Self> {
        let project = backend.fetch_project().await?;
        let window = RecordingWindow::parse(project.recording_time.as_deref());
        let (segments, schedule_items, performers) = futures::try_join!(
            backend.fetch_segments(),
            backend.fetch_schedule_items(),
            backend.fetch_performers()
        )?;

        log::info!("Opened project {} ({})", project.id, project.title);
        let editor = Editor::load(config, window, &segments, &schedule_items, &performers);
        Ok(Self {
            backend,
            editor,
            last_saved: None,
        })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut Editor {
        &mut self.editor
    }

    /// Time of the last successful bulk save
    pub fn last_saved(&self) -> Option<DateTime<Utc>> {
        self.last_saved
    }

    /// Sends every queued change in order.
    ///
    /// Failures are logged and reported but never roll back local state;
    /// transient ones go back in the queue. When schedule records were
    /// written, they are re-fetched and reconciled, unless a local item still
    /// has no record: reconciliation would drop it.
    pub async fn flush(&mut self) -> FlushReport {
        let mut report = FlushReport::default();
        let mut schedule_written = false;
        let mut retry = Vec::new();

        for queued in self.editor.take_notifications() {
            let Some(notification) = self.current(queued) else {
                report.skipped += 1;
                continue;
            };
            schedule_written |= notification.touches_schedule_items();

            match send(&self.backend, notification.clone()).await {
                Ok(created) => {
                    report.sent += 1;
                    if let Some((local_id, external_id)) = created {
                        self.bind(&local_id, external_id);
                    }
                }
                Err(err) => {
                    log::warn!("Failed to persist {:?}: {}", notification, err);
                    if err.is_transient() {
                        retry.push(notification.clone());
                    }
                    report.failed.push(FailedRequest {
                        notification,
                        error: err.to_string(),
                    });
                }
            }
        }

        report.requeued = retry.len();
        self.editor.requeue(retry);

        let unpersisted = self.editor.store().unpersisted().count();
        if schedule_written && unpersisted > 0 {
            log::warn!(
                "{} local items have no record yet, skipping re-fetch to keep them",
                unpersisted
            );
        } else if schedule_written {
            match self.backend.fetch_schedule_items().await {
                Ok(records) => {
                    self.editor.reconcile(&records);
                    report.refetched = true;
                }
                Err(err) => log::warn!("Failed to re-fetch schedule items: {}", err),
            }
        }

        log::info!(
            "Flushed {} changes: {} sent, {} skipped, {} failed, {} requeued",
            report.sent + report.skipped + report.failed.len(),
            report.sent,
            report.skipped,
            report.failed.len(),
            report.requeued
        );
        report
    }

    /// Sends the full state of every held item concurrently.
    ///
    /// Items never persisted are created. `last_saved` only moves when every
    /// request succeeds.
    pub async fn save_all(&mut self) -> Result<SaveOutcome> {
        let requests = self.editor.save_all_requests();
        let total = requests.len();
        let results = join_all(requests.into_iter().map(|request| send(&self.backend, request))).await;

        let mut failed = 0;
        for result in results {
            match result {
                Ok(Some((local_id, external_id))) => self.bind(&local_id, external_id),
                Ok(None) => {}
                Err(err) => {
                    log::warn!("Bulk save request failed: {}", err);
                    failed += 1;
                }
            }
        }
        if failed > 0 {
            return Err(Error::BulkSaveFailed { failed, total });
        }

        let saved_at = Utc::now();
        self.last_saved = Some(saved_at);
        log::info!("Saved {} requests at {}", total, saved_at.to_rfc3339());
        Ok(SaveOutcome {
            saved_at,
            requests: total,
        })
    }

    /// Rebuilds a queued create from the item as it is now; `None` when the
    /// item is gone or already persisted
    fn current(&self, notification: Notification) -> Option<Notification> {
        let Notification::CreateScheduleItem { local_id, kind, .. } = &notification else {
            return Some(notification);
        };
        let item = self.editor.store().get(local_id)?;
        if item.external_id.is_some() {
            return None;
        }
        Some(Notification::CreateScheduleItem {
            local_id: local_id.clone(),
            kind: *kind,
            title: item.title.clone(),
            start_time: item.start_time(),
            duration_minutes: item.duration,
        })
    }

    fn bind(&mut self, local_id: &ItemId, external_id: String) {
        if let Err(err) = self.editor.bind_external_id(local_id, external_id) {
            log::debug!("Created record has no local item: {}", err);
        }
    }
}

/// Performs one request; a create yields the local id and the assigned id
async fn send<B: ScheduleBackend + ?Sized>(
    backend: &B,
    notification: Notification,
) -> Result<Option<(ItemId, String)>> {
    match notification {
        Notification::SegmentTime { plan_id, start_time } => {
            backend.update_segment_time(plan_id, start_time).await?;
        }
        Notification::SegmentDuration { plan_id, duration_text } => {
            backend.update_segment_duration(plan_id, duration_text).await?;
        }
        Notification::CreateScheduleItem {
            local_id,
            kind,
            title,
            start_time,
            duration_minutes,
        } => {
            let record = backend
                .create_schedule_item(NewScheduleItem {
                    kind,
                    title,
                    start_time,
                    duration_minutes,
                })
                .await?;
            return Ok(Some((local_id, record.id)));
        }
        Notification::UpdateScheduleItem { external_id, patch } => {
            backend.update_schedule_item(external_id, patch).await?;
        }
        Notification::DeleteScheduleItem { external_id } => {
            backend.delete_schedule_item(external_id).await?;
        }
    }
    Ok(None)
}
