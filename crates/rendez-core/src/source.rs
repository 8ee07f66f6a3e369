use crate::error::{RendezError, Result};
use crate::types::{EventRecord, ScoredEvent};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

/// Supplies the event records the index is populated from.
///
/// The engine treats whatever is behind this trait as an opaque
/// collaborator: a file, a database, a fixture list.
pub trait EventSource: Send + Sync {
    fn load_events(&self) -> Result<Vec<EventRecord>>;
}

/// Event source reading a JSON array of event records from disk.
///
/// An unreadable or unparseable file is `SourceUnavailable` (fatal to
/// initialization). Individual records that fail to deserialize are
/// skipped with a warning so one bad entry cannot block the feed.
pub struct JsonEventSource {
    path: PathBuf,
}

impl JsonEventSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl EventSource for JsonEventSource {
    fn load_events(&self) -> Result<Vec<EventRecord>> {
        let raw = fs::read_to_string(&self.path).map_err(|e| {
            RendezError::SourceUnavailable(format!("{}: {}", self.path.display(), e))
        })?;

        let values: Vec<serde_json::Value> = serde_json::from_str(&raw).map_err(|e| {
            RendezError::SourceUnavailable(format!("{}: {}", self.path.display(), e))
        })?;

        let mut events = Vec::with_capacity(values.len());
        for value in values {
            match serde_json::from_value::<EventRecord>(value) {
                Ok(event) => events.push(event),
                Err(e) => log::warn!("Skipping undeserializable event record: {}", e),
            }
        }

        Ok(events)
    }
}

/// Fixed in-memory event list.
pub struct InMemorySource {
    events: Vec<EventRecord>,
}

impl InMemorySource {
    pub fn new(events: Vec<EventRecord>) -> Self {
        Self { events }
    }
}

impl EventSource for InMemorySource {
    fn load_events(&self) -> Result<Vec<EventRecord>> {
        Ok(self.events.clone())
    }
}

/// Receives the most recent recommendation result list.
///
/// A debugging/auditing side channel for collaborators; never
/// consulted on later calls.
pub trait SnapshotSink: Send + Sync {
    fn persist(&self, results: &[ScoredEvent]) -> Result<()>;
}

impl<T: SnapshotSink + ?Sized> SnapshotSink for std::sync::Arc<T> {
    fn persist(&self, results: &[ScoredEvent]) -> Result<()> {
        (**self).persist(results)
    }
}

/// Writes each result list as pretty-printed JSON, replacing the
/// previous snapshot.
pub struct JsonSnapshotSink {
    path: PathBuf,
}

impl JsonSnapshotSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SnapshotSink for JsonSnapshotSink {
    fn persist(&self, results: &[ScoredEvent]) -> Result<()> {
        let file = fs::File::create(&self.path)?;
        serde_json::to_writer_pretty(file, results)?;
        Ok(())
    }
}

/// Keeps every persisted result list in memory. Handy for asserting
/// on the side channel in tests.
#[derive(Default)]
pub struct MemorySink {
    snapshots: Mutex<Vec<Vec<ScoredEvent>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshots(&self) -> Vec<Vec<ScoredEvent>> {
        self.snapshots.lock().expect("snapshot lock poisoned").clone()
    }
}

impl SnapshotSink for MemorySink {
    fn persist(&self, results: &[ScoredEvent]) -> Result<()> {
        self.snapshots
            .lock()
            .map_err(|_| RendezError::Validation("snapshot lock poisoned".to_string()))?
            .push(results.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_source_unavailable() {
        let source = JsonEventSource::new("/nonexistent/events.json");
        assert!(matches!(
            source.load_events(),
            Err(RendezError::SourceUnavailable(_))
        ));
    }

    #[test]
    fn test_invalid_json_is_source_unavailable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("events.json");
        fs::write(&path, "not json at all").unwrap();

        let source = JsonEventSource::new(&path);
        assert!(matches!(
            source.load_events(),
            Err(RendezError::SourceUnavailable(_))
        ));
    }

    #[test]
    fn test_loads_records_and_skips_undeserializable_ones() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("events.json");
        fs::write(
            &path,
            r#"[
                {
                    "Title": "Tech Fest",
                    "location": "Auditorium",
                    "summary": "Annual technology festival",
                    "target_audience": "All students",
                    "Tags": ["technology"]
                },
                {"Title": "No other fields"},
                {
                    "title": "Career Fair",
                    "location": "Sports Hall",
                    "summary": "Meet recruiters",
                    "target_audience": "Final year students"
                }
            ]"#,
        )
        .unwrap();

        let events = JsonEventSource::new(&path).load_events().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].title, "Tech Fest");
        assert_eq!(events[1].title, "Career Fair");
    }

    #[test]
    fn test_json_snapshot_sink_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("search_results.json");

        let results = vec![ScoredEvent {
            score: 0.72,
            event: EventRecord::new("Tech Fest", "Auditorium", "Festival", "Students"),
        }];

        JsonSnapshotSink::new(&path).persist(&results).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        let parsed: Vec<ScoredEvent> = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].event.title, "Tech Fest");
    }

    #[test]
    fn test_memory_sink_collects_snapshots() {
        let sink = MemorySink::new();
        sink.persist(&[]).unwrap();
        sink.persist(&[ScoredEvent {
            score: 0.5,
            event: EventRecord::new("a", "b", "c", "d"),
        }])
        .unwrap();

        let snapshots = sink.snapshots();
        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[1][0].event.title, "a");
    }
}
