//! The context synchronizer — the periodic task that keeps an active
//! session supplied with fresh context.
//!
//! Each tick polls two change sources: the memory snapshot (diffed against
//! the previous stringified context) and the append-only update queue
//! (read from a byte offset). Both feed one submission path: records that
//! don't apply to the current session are dropped, never queued — the
//! next natural change produces a fresh record.

use std::time::Duration;

use sitara_context::store::SnapshotWatermark;
use sitara_context::{ContextStore, UpdateQueue};
use sitara_core::snapshot::{StringMap, changed_keys};
use sitara_core::update::PendingUpdate;
use sitara_transport::SessionTransport;
use tracing::{debug, info, warn};

/// Periodic poller of the two context sources.
pub struct ContextSynchronizer {
    store: ContextStore,
    queue: UpdateQueue,
    interval: Duration,
    watch_snapshot: bool,
    watch_queue: bool,

    // Per-source watermarks; in-process only
    snapshot_mark: SnapshotWatermark,
    queue_offset: u64,
    last_vars: StringMap,
}

impl ContextSynchronizer {
    /// Create a synchronizer seeded with the session-start context, so the
    /// first tick only reports changes made after startup.
    pub fn new(
        store: ContextStore,
        queue: UpdateQueue,
        interval: Duration,
        initial_vars: StringMap,
    ) -> Self {
        let (_, snapshot_mark) = store.has_changed(&SnapshotWatermark::default());
        Self {
            store,
            queue,
            interval,
            watch_snapshot: true,
            watch_queue: true,
            snapshot_mark,
            queue_offset: 0,
            last_vars: initial_vars,
        }
    }

    /// Enable or disable the snapshot source.
    pub fn with_snapshot_watch(mut self, enabled: bool) -> Self {
        self.watch_snapshot = enabled;
        self
    }

    /// Enable or disable the update-queue source.
    pub fn with_queue_watch(mut self, enabled: bool) -> Self {
        self.watch_queue = enabled;
        self
    }

    /// Run ticks until the session closes.
    pub async fn run(mut self, transport: &SessionTransport) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first interval tick fires immediately; skip it so the first
        // real poll happens one interval after session start.
        ticker.tick().await;

        info!(
            interval_ms = self.interval.as_millis() as u64,
            "Context synchronizer started"
        );

        loop {
            ticker.tick().await;
            if transport.handle().snapshot().await.is_closed() {
                debug!("Session closed; synchronizer stopping");
                break;
            }
            self.tick(transport).await;
        }
    }

    /// One poll cycle over both sources.
    pub async fn tick(&mut self, transport: &SessionTransport) {
        let mut records: Vec<PendingUpdate> = Vec::new();

        if self.watch_snapshot {
            if let Some(record) = self.collect_snapshot_update() {
                records.push(record);
            }
        }
        if self.watch_queue {
            records.extend(self.collect_queue_updates());
        }
        if records.is_empty() {
            return;
        }

        let session = transport.handle().snapshot().await;
        if !session.is_active() {
            // No cross-session buffering: stale context must not leak into
            // a later, unrelated session.
            debug!(
                dropped = records.len(),
                "No active session; dropping pending updates"
            );
            return;
        }

        for record in records {
            if !record.applies_to(session.conversation_id()) {
                debug!(
                    target = ?record.target,
                    current = ?session.conversation_id(),
                    "Dropping update for a different session"
                );
                continue;
            }
            info!(text = %record.text, "Forwarding contextual update");
            if let Err(e) = transport.send_contextual_update(&record).await {
                // Best-effort: drop the record, the next change re-produces one
                warn!(error = %e, "Failed to send contextual update");
            }
        }
    }

    /// Diff the snapshot source; at most one record per tick.
    fn collect_snapshot_update(&mut self) -> Option<PendingUpdate> {
        let (changed, mark) = self.store.has_changed(&self.snapshot_mark);
        if !changed {
            return None;
        }
        self.snapshot_mark = mark;

        let snapshot = match self.store.read_snapshot() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                // Treated as "no change since last success"
                warn!(error = %e, "Snapshot read failed");
                return None;
            }
        };

        let current = snapshot.stringify();
        let changed = changed_keys(&self.last_vars, &current);
        self.last_vars = current;

        PendingUpdate::from_changed_keys(&changed)
    }

    /// Drain the queue source; one record per valid appended line.
    fn collect_queue_updates(&mut self) -> Vec<PendingUpdate> {
        match self.queue.read_new(self.queue_offset) {
            Ok((records, offset)) => {
                self.queue_offset = offset;
                records
            }
            Err(e) => {
                warn!(error = %e, "Update queue read failed");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Arc;

    use async_trait::async_trait;
    use sitara_core::error::TransportError;
    use sitara_core::event::EventBus;
    use sitara_core::session::{SessionState, SharedSessionHandle};
    use sitara_core::tool::ToolRegistry;
    use sitara_core::transcript::SharedTranscript;
    use sitara_transport::protocol::OutboundEvent;
    use sitara_transport::session::OutboundSink;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        sent: Mutex<Vec<OutboundEvent>>,
    }

    #[async_trait]
    impl OutboundSink for RecordingSink {
        async fn send(&self, event: &OutboundEvent) -> Result<(), TransportError> {
            self.sent.lock().await.push(event.clone());
            Ok(())
        }
        async fn shutdown(&self) -> Result<(), TransportError> {
            Ok(())
        }
    }

    struct Fixture {
        sink: Arc<RecordingSink>,
        transport: SessionTransport,
        dir: tempfile::TempDir,
        store: ContextStore,
        queue: UpdateQueue,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let store = ContextStore::new(dir.path().join("memory_buffer.json"));
        let queue = UpdateQueue::new(dir.path().join("updates.ndjson"));
        let sink = Arc::new(RecordingSink::default());
        let transport = SessionTransport::new(
            Arc::clone(&sink) as Arc<dyn OutboundSink>,
            SharedSessionHandle::new(),
            SharedTranscript::new(),
            Arc::new(ToolRegistry::new()),
            Arc::new(EventBus::default()),
        );
        Fixture {
            sink,
            transport,
            dir,
            store,
            queue,
        }
    }

    async fn activate(transport: &SessionTransport, id: &str) {
        transport.handle().set_state(SessionState::Initiating).await;
        transport.handle().activate(id).await;
    }

    fn write_snapshot(fixture: &Fixture, content: &str) {
        let path = fixture.dir.path().join("memory_buffer.json");
        let mut file = std::fs::File::create(path).unwrap();
        write!(file, "{content}").unwrap();
    }

    fn synchronizer(fixture: &Fixture) -> ContextSynchronizer {
        ContextSynchronizer::new(
            fixture.store.clone(),
            fixture.queue.clone(),
            Duration::from_millis(10),
            StringMap::new(),
        )
    }

    async fn sent_updates(sink: &RecordingSink) -> Vec<(String, Option<String>)> {
        sink.sent
            .lock()
            .await
            .iter()
            .filter_map(|e| match e {
                OutboundEvent::ContextualUpdate {
                    text,
                    conversation_id,
                } => Some((text.clone(), conversation_id.clone())),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn snapshot_change_produces_one_summary_record() {
        let fixture = fixture();
        activate(&fixture.transport, "S1").await;
        let mut sync = synchronizer(&fixture);

        write_snapshot(&fixture, r#"{"focus": "career", "moon": "cancer"}"#);
        sync.tick(&fixture.transport).await;

        let updates = sent_updates(&fixture.sink).await;
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].0, "Context update: focus, moon");
        assert_eq!(updates[0].1.as_deref(), Some("S1"));
    }

    #[tokio::test]
    async fn unchanged_snapshot_produces_nothing() {
        let fixture = fixture();
        activate(&fixture.transport, "S1").await;
        let mut sync = synchronizer(&fixture);

        write_snapshot(&fixture, r#"{"focus": "career"}"#);
        sync.tick(&fixture.transport).await;
        sync.tick(&fixture.transport).await;

        let updates = sent_updates(&fixture.sink).await;
        assert_eq!(updates.len(), 1, "second tick must not re-report");
    }

    #[tokio::test]
    async fn queue_lines_forward_as_individual_updates() {
        let fixture = fixture();
        activate(&fixture.transport, "S1").await;
        let mut sync = synchronizer(&fixture);

        fixture.queue.append("mars entered aries", None).unwrap();
        fixture.queue.append("client asked about love", None).unwrap();
        sync.tick(&fixture.transport).await;

        let updates = sent_updates(&fixture.sink).await;
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].0, "mars entered aries");
        assert_eq!(updates[1].0, "client asked about love");
    }

    #[tokio::test]
    async fn mismatched_target_is_dropped() {
        let fixture = fixture();
        activate(&fixture.transport, "S1").await;
        let mut sync = synchronizer(&fixture);

        fixture.queue.append("for another session", Some("S2")).unwrap();
        fixture.queue.append("for this session", Some("S1")).unwrap();
        sync.tick(&fixture.transport).await;

        let updates = sent_updates(&fixture.sink).await;
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].0, "for this session");
    }

    #[tokio::test]
    async fn records_before_active_session_never_reach_the_wire() {
        let fixture = fixture();
        let mut sync = synchronizer(&fixture);

        write_snapshot(&fixture, r#"{"focus": "career"}"#);
        fixture.queue.append("early update", None).unwrap();
        sync.tick(&fixture.transport).await;

        assert!(fixture.sink.sent.lock().await.is_empty());

        // Activating afterwards must not resurrect the dropped records
        activate(&fixture.transport, "S1").await;
        sync.tick(&fixture.transport).await;
        assert!(
            sent_updates(&fixture.sink).await.is_empty(),
            "dropped records must not be buffered across ticks"
        );
    }

    #[tokio::test]
    async fn snapshot_diff_is_against_previous_stringified_context() {
        let fixture = fixture();
        activate(&fixture.transport, "S1").await;

        write_snapshot(&fixture, r#"{"x": "1", "y": "2"}"#);
        let initial = fixture.store.read_snapshot().unwrap().stringify();
        let mut sync = ContextSynchronizer::new(
            fixture.store.clone(),
            fixture.queue.clone(),
            Duration::from_millis(10),
            initial,
        );

        // Ensure the rewrite lands on a strictly newer mtime
        std::thread::sleep(Duration::from_millis(25));
        write_snapshot(&fixture, r#"{"x": "1", "y": "3", "z": "4"}"#);
        sync.tick(&fixture.transport).await;

        let updates = sent_updates(&fixture.sink).await;
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].0, "Context update: y, z");
    }

    #[tokio::test]
    async fn unreadable_snapshot_keeps_the_loop_alive() {
        let fixture = fixture();
        activate(&fixture.transport, "S1").await;
        let mut sync = synchronizer(&fixture);

        write_snapshot(&fixture, "definitely not json");
        sync.tick(&fixture.transport).await;
        assert!(fixture.sink.sent.lock().await.is_empty());

        // A later valid write (on a strictly newer mtime) still gets picked up
        std::thread::sleep(Duration::from_millis(25));
        write_snapshot(&fixture, r#"{"focus": "career"}"#);
        sync.tick(&fixture.transport).await;
        assert_eq!(sent_updates(&fixture.sink).await.len(), 1);
    }

    #[tokio::test]
    async fn disabled_sources_are_ignored() {
        let fixture = fixture();
        activate(&fixture.transport, "S1").await;
        let mut sync = synchronizer(&fixture)
            .with_snapshot_watch(false)
            .with_queue_watch(false);

        write_snapshot(&fixture, r#"{"focus": "career"}"#);
        fixture.queue.append("queued line", None).unwrap();
        sync.tick(&fixture.transport).await;

        assert!(fixture.sink.sent.lock().await.is_empty());
    }
}
