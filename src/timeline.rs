use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppendError, SnapshotError};

/// Key of the persistent slot that holds the serialized timeline.
pub const STORAGE_KEY: &str = "@SimpleChatApp_messages";
pub const LOCAL_USER_ID: &str = "1";
pub const COUNTERPART_ID: &str = "2";
pub const WELCOME_ID: &str = "0";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: String,
    pub name: String,
}

impl Author {
    pub fn local(name: impl Into<String>) -> Self {
        Self { id: LOCAL_USER_ID.to_string(), name: name.into() }
    }

    pub fn counterpart(name: impl Into<String>) -> Self {
        Self { id: COUNTERPART_ID.to_string(), name: name.into() }
    }

    pub fn is_local(&self) -> bool {
        self.id == LOCAL_USER_ID
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub text: String,
    #[serde(rename = "createdAt", with = "iso_millis")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "user")]
    pub author: Author,
}

impl Message {
    fn has_blank_text(&self) -> bool {
        self.text.trim().is_empty()
    }
}

// Snapshot timestamps are RFC 3339 in UTC with millisecond precision.
mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(at: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&at.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|at| at.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

/// The ordered, append-only list of messages of the single conversation.
#[derive(Debug, Clone)]
pub struct Timeline {
    messages: Vec<Message>,
    // largest numeric id seen so far, new ids are always above it
    last_id: u64,
}

impl Timeline {
    /// A timeline holding only the counterpart's welcome message.
    pub fn seeded(welcome_text: &str, counterpart: Author, at: DateTime<Utc>) -> Self {
        let welcome = Message {
            id: WELCOME_ID.to_string(),
            text: welcome_text.to_string(),
            created_at: at,
            author: counterpart,
        };
        Self { messages: vec![welcome], last_id: 0 }
    }

    /// Rebuilds a timeline from a stored snapshot. Anything that does not
    /// describe a valid timeline is rejected whole.
    pub fn from_snapshot(json: &str) -> Result<Self, SnapshotError> {
        let messages: Vec<Message> = serde_json::from_str(json)?;
        if messages.is_empty() {
            return Err(SnapshotError::Empty);
        }
        let mut seen = HashSet::with_capacity(messages.len());
        for message in &messages {
            if message.has_blank_text() {
                return Err(SnapshotError::BlankText(message.id.clone()));
            }
            if !seen.insert(message.id.as_str()) {
                return Err(SnapshotError::DuplicateId(message.id.clone()));
            }
        }
        let last_id = messages
            .iter()
            .filter_map(|m| m.id.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        Ok(Self { messages, last_id })
    }

    pub fn to_snapshot(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string(&self.messages)?)
    }

    /// Id for a message created at `at`: its epoch milliseconds, bumped
    /// past every numeric id already in the timeline. Once the numeric
    /// range is used up, ids become `<millis>-<n>` with the first free `n`.
    pub fn next_id(&self, at: DateTime<Utc>) -> String {
        let millis = u64::try_from(at.timestamp_millis()).unwrap_or(0);
        if let Some(after_last) = self.last_id.checked_add(1) {
            return millis.max(after_last).to_string();
        }
        (self.messages.len()..)
            .map(|n| format!("{millis}-{n}"))
            .find(|id| self.messages.iter().all(|m| &m.id != id))
            .unwrap_or_default()
    }

    pub fn compose(&self, author: Author, text: &str, at: DateTime<Utc>) -> Message {
        Message {
            id: self.next_id(at),
            text: text.to_string(),
            created_at: at,
            author,
        }
    }

    pub fn append(&mut self, message: Message) -> Result<&Message, AppendError> {
        if message.has_blank_text() {
            return Err(AppendError::BlankText);
        }
        if self.messages.iter().any(|m| m.id == message.id) {
            return Err(AppendError::DuplicateId(message.id));
        }
        if let Ok(numeric) = message.id.parse::<u64>() {
            self.last_id = self.last_id.max(numeric);
        }
        self.messages.push(message);
        Ok(&self.messages[self.messages.len() - 1])
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64, millis: u32) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, millis * 1_000_000).unwrap()
    }

    fn seeded() -> Timeline {
        Timeline::seeded("Welcome!", Author::counterpart("ChatBot"), at(0, 0))
    }

    #[test]
    fn test_seeded_holds_welcome_from_counterpart() {
        let timeline = seeded();
        assert_eq!(timeline.len(), 1);
        let welcome = &timeline.messages()[0];
        assert_eq!(welcome.id, WELCOME_ID);
        assert_eq!(welcome.author.id, COUNTERPART_ID);
    }

    #[test]
    fn test_append_grows_by_one_and_keeps_text() {
        let mut timeline = seeded();
        for (i, text) in ["hello", "  padded  ", "multi\nline", "ü"].into_iter().enumerate() {
            let before = timeline.len();
            let message = timeline.compose(Author::local("You"), text, at(i as i64 + 1, 0));
            timeline.append(message).unwrap();
            assert_eq!(timeline.len(), before + 1);
            assert_eq!(timeline.last().unwrap().text, text);
        }
    }

    #[test]
    fn test_append_rejects_blank_text() {
        let mut timeline = seeded();
        for text in ["", " ", "\n\t  "] {
            let message = timeline.compose(Author::local("You"), text, at(5, 0));
            assert_eq!(timeline.append(message), Err(AppendError::BlankText));
        }
        assert_eq!(timeline.len(), 1);
    }

    #[test]
    fn test_append_rejects_duplicate_id() {
        let mut timeline = seeded();
        let mut message = timeline.compose(Author::local("You"), "hi", at(1, 0));
        message.id = WELCOME_ID.to_string();
        assert_eq!(
            timeline.append(message),
            Err(AppendError::DuplicateId(WELCOME_ID.to_string()))
        );
    }

    #[test]
    fn test_ids_stay_unique_within_one_millisecond() {
        let mut timeline = seeded();
        let now = at(10, 250);
        let first = timeline.compose(Author::local("You"), "one", now);
        timeline.append(first).unwrap();
        let second = timeline.compose(Author::counterpart("ChatBot"), "two", now);
        timeline.append(second).unwrap();
        let ids: Vec<&str> = timeline.messages().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids[1], now.timestamp_millis().to_string());
        assert_eq!(ids[2], (now.timestamp_millis() + 1).to_string());
    }

    #[test]
    fn test_next_id_moves_past_clock_going_backwards() {
        let mut timeline = seeded();
        let later = timeline.compose(Author::local("You"), "later", at(100, 0));
        timeline.append(later).unwrap();
        let id = timeline.next_id(at(50, 0));
        assert_eq!(id, (at(100, 0).timestamp_millis() + 1).to_string());
    }

    #[test]
    fn test_snapshot_field_layout() {
        let timeline = Timeline::seeded("Welcome!", Author::counterpart("ChatBot"), at(0, 42));
        let json: serde_json::Value =
            serde_json::from_str(&timeline.to_snapshot().unwrap()).unwrap();
        let entry = &json[0];
        assert_eq!(entry["id"], "0");
        assert_eq!(entry["text"], "Welcome!");
        assert_eq!(entry["createdAt"], "2023-11-14T22:13:20.042Z");
        assert_eq!(entry["user"]["id"], "2");
        assert_eq!(entry["user"]["name"], "ChatBot");
    }

    #[test]
    fn test_snapshot_round_trip_to_millisecond() {
        let mut timeline = seeded();
        let precise = Utc.timestamp_opt(1_700_000_123, 456_789_012).unwrap();
        let message = timeline.compose(Author::local("You"), "hello", precise);
        timeline.append(message).unwrap();

        let restored = Timeline::from_snapshot(&timeline.to_snapshot().unwrap()).unwrap();
        assert_eq!(restored.len(), timeline.len());
        for (a, b) in restored.messages().iter().zip(timeline.messages()) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.text, b.text);
            assert_eq!(a.author, b.author);
            assert_eq!(a.created_at.timestamp_millis(), b.created_at.timestamp_millis());
        }
    }

    #[test]
    fn test_restored_timeline_keeps_ids_increasing() {
        let json = r#"[{"id":"1700000000500","text":"hi","createdAt":"2023-11-14T22:13:20.500Z","user":{"id":"1","name":"You"}}]"#;
        let timeline = Timeline::from_snapshot(json).unwrap();
        assert_eq!(timeline.next_id(at(0, 0)), "1700000000501");
    }

    #[test]
    fn test_ids_after_largest_numeric_id_stay_unique() {
        let json = r#"[{"id":"18446744073709551615","text":"hi","createdAt":"2023-11-14T22:13:20.500Z","user":{"id":"1","name":"You"}}]"#;
        let mut timeline = Timeline::from_snapshot(json).unwrap();
        for text in ["one", "two", "three"] {
            let message = timeline.compose(Author::local("You"), text, at(0, 0));
            timeline.append(message).unwrap();
        }
        let ids: HashSet<&str> = timeline.messages().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids.len(), 4);
        assert_eq!(timeline.messages()[1].id, "1700000000000-1");
    }

    #[test]
    fn test_snapshot_accepts_offset_timestamps() {
        let json = r#"[{"id":"a","text":"hi","createdAt":"2024-01-01T12:00:00+02:00","user":{"id":"1","name":"You"}}]"#;
        let timeline = Timeline::from_snapshot(json).unwrap();
        assert_eq!(
            timeline.messages()[0].created_at,
            Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_snapshot_rejections() {
        assert!(matches!(Timeline::from_snapshot("{not json"), Err(SnapshotError::Json(_))));
        assert!(matches!(Timeline::from_snapshot(r#"{"id":"0"}"#), Err(SnapshotError::Json(_))));
        assert!(matches!(
            Timeline::from_snapshot(r#"[{"id":"0","text":"x","createdAt":"yesterday","user":{"id":"2","name":"B"}}]"#),
            Err(SnapshotError::Json(_))
        ));
        assert!(matches!(Timeline::from_snapshot("[]"), Err(SnapshotError::Empty)));
        assert!(matches!(
            Timeline::from_snapshot(r#"[{"id":"0","text":"  ","createdAt":"2024-01-01T00:00:00.000Z","user":{"id":"2","name":"B"}}]"#),
            Err(SnapshotError::BlankText(id)) if id == "0"
        ));
        let dup = r#"[
            {"id":"7","text":"a","createdAt":"2024-01-01T00:00:00.000Z","user":{"id":"1","name":"You"}},
            {"id":"7","text":"b","createdAt":"2024-01-01T00:00:01.000Z","user":{"id":"2","name":"B"}}
        ]"#;
        assert!(matches!(Timeline::from_snapshot(dup), Err(SnapshotError::DuplicateId(id)) if id == "7"));
    }
}
