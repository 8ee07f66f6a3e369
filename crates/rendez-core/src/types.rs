use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Type alias for event identifiers
pub type EventId = Uuid;

/// Type alias for embedding vectors
pub type Embedding = Vec<f32>;

/// An event as supplied by the event source and stored as a point
/// payload in the vector index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventRecord {
    /// Stable identifier, unique within a collection. Assigned at
    /// ingestion (UUIDv7) when the source record carries none.
    /// Re-ingesting with the same id replaces the stored point.
    #[serde(default)]
    pub id: Option<EventId>,

    /// Event title. Required. Upstream feeds spell this `Title`.
    #[serde(alias = "Title")]
    pub title: String,

    /// Where the event takes place. Required.
    pub location: String,

    /// Free-text description. Required.
    pub summary: String,

    /// Who the event is aimed at. Required.
    pub target_audience: String,

    /// Free-text tags, in source order. Optional; only used when the
    /// engine is configured to blend a tag embedding into the event
    /// vector. Upstream feeds spell this `Tags`.
    #[serde(default, alias = "Tags")]
    pub tags: Vec<String>,

    #[serde(default)]
    pub date: Option<NaiveDate>,

    #[serde(default)]
    pub time: Option<NaiveTime>,

    /// Coarse category ("Workshop", "Festival", ...). Optional.
    #[serde(default)]
    pub event_type: Option<String>,
}

impl EventRecord {
    /// Build a record from the four required descriptive fields.
    pub fn new(
        title: impl Into<String>,
        location: impl Into<String>,
        summary: impl Into<String>,
        target_audience: impl Into<String>,
    ) -> Self {
        EventRecord {
            id: None,
            title: title.into(),
            location: location.into(),
            summary: summary.into(),
            target_audience: target_audience.into(),
            tags: Vec::new(),
            date: None,
            time: None,
            event_type: None,
        }
    }

    pub fn with_id(mut self, id: EventId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Check the descriptive fields the event vector is derived from.
    /// A record failing this is skipped during ingestion, not fatal.
    pub fn validate(&self) -> Result<(), String> {
        for (field, value) in [
            ("title", &self.title),
            ("location", &self.location),
            ("summary", &self.summary),
            ("target_audience", &self.target_audience),
        ] {
            if value.trim().is_empty() {
                return Err(format!("missing required field `{}`", field));
            }
        }
        Ok(())
    }
}

/// A user profile as supplied by the profile store.
///
/// Profiles are inputs only — the engine never writes them back.
/// Attendance updates to `past_events` are owned by the external
/// profile store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub name: String,
    pub gender: String,
    pub role: String,
    pub department: String,

    /// Degree year. Absent for non-student roles.
    #[serde(default)]
    pub year: Option<u8>,

    /// Interest categories, most-preferred first. Rank position feeds
    /// the interest weighting policy.
    #[serde(default)]
    pub interests: Vec<String>,

    /// Titles of events the user already attended.
    #[serde(default)]
    pub past_events: Vec<String>,
}

impl UserProfile {
    pub fn new(name: impl Into<String>, gender: impl Into<String>, role: impl Into<String>) -> Self {
        UserProfile {
            name: name.into(),
            gender: gender.into(),
            role: role.into(),
            department: String::new(),
            year: None,
            interests: Vec::new(),
            past_events: Vec::new(),
        }
    }

    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = department.into();
        self
    }

    pub fn with_year(mut self, year: u8) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_interests(mut self, interests: Vec<String>) -> Self {
        self.interests = interests;
        self
    }

    pub fn with_past_events(mut self, past_events: Vec<String>) -> Self {
        self.past_events = past_events;
        self
    }
}

/// One ranked recommendation: the stored payload plus its cosine
/// similarity to the query vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredEvent {
    pub score: f32,
    pub event: EventRecord,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_accepts_complete_record() {
        let event = EventRecord::new(
            "Robotics Workshop",
            "Main Hall",
            "Hands-on robotics session",
            "Engineering students",
        );
        assert!(event.validate().is_ok());
    }

    #[test]
    fn validate_rejects_blank_required_field() {
        let event = EventRecord::new("Robotics Workshop", "  ", "Hands-on session", "Students");
        let err = event.validate().unwrap_err();
        assert!(err.contains("location"));
    }

    #[test]
    fn deserializes_upstream_key_spellings() {
        let json = r#"{
            "Title": "Tech Fest",
            "location": "Auditorium",
            "summary": "Annual technology festival",
            "target_audience": "All students",
            "Tags": ["technology", "festival"]
        }"#;
        let event: EventRecord = serde_json::from_str(json).unwrap();
        assert_eq!(event.title, "Tech Fest");
        assert_eq!(event.tags, vec!["technology", "festival"]);
        assert!(event.id.is_none());
        assert!(event.date.is_none());
    }
}
