//! Append-only event log of orchestration activity.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::provider::ProviderId;

/// Category of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    System,
    Agent,
    Thinking,
    Spawn,
    Tool,
    Success,
    Result,
    Error,
}

impl LogKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Agent => "agent",
            Self::Thinking => "thinking",
            Self::Spawn => "spawn",
            Self::Tool => "tool",
            Self::Success => "success",
            Self::Result => "result",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single event log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    /// Unique, strictly increasing within a session.
    pub id: u64,
    /// Run the entry belongs to.
    pub run_id: u64,
    pub timestamp: SystemTime,
    #[serde(rename = "type")]
    pub kind: LogKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderId>,
}

impl LogEntry {
    /// Wall-clock time of the entry as `HH:MM:SS` (UTC).
    #[must_use]
    pub fn clock(&self) -> String {
        format_clock(self.timestamp)
    }
}

/// Format a timestamp as `HH:MM:SS` (UTC, 24h).
#[must_use]
pub fn format_clock(ts: SystemTime) -> String {
    let secs = ts
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
        % 86_400;
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
}

/// Ordered log buffer.
///
/// Entries are only ever appended; the whole buffer can be cleared at the
/// start of a run. Ids keep increasing across clears.
#[derive(Debug)]
pub struct EventLog {
    entries: Vec<LogEntry>,
    next_id: u64,
    last_timestamp: Option<SystemTime>,
}

impl EventLog {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 1,
            last_timestamp: None,
        }
    }

    /// Append an entry stamped with the next id and the current time.
    pub fn append(
        &mut self,
        run_id: u64,
        kind: LogKind,
        message: impl Into<String>,
        provider: Option<ProviderId>,
    ) -> &LogEntry {
        let now = SystemTime::now();
        // The system clock can step backwards; append order wins.
        let timestamp = match self.last_timestamp {
            Some(last) if now < last => last,
            _ => now,
        };
        self.last_timestamp = Some(timestamp);

        let id = self.next_id;
        self.next_id += 1;
        self.entries.push(LogEntry {
            id,
            run_id,
            timestamp,
            kind,
            message: message.into(),
            provider,
        });
        &self.entries[self.entries.len() - 1]
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.last()
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn ids_strictly_increase_across_clear() {
        let mut log = EventLog::new();
        let a = log.append(1, LogKind::System, "a", None).id;
        let b = log.append(1, LogKind::Agent, "b", None).id;
        log.clear();
        let c = log.append(2, LogKind::System, "c", None).id;
        assert!(a < b && b < c);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn timestamps_non_decreasing() {
        let mut log = EventLog::new();
        for i in 0..50 {
            log.append(1, LogKind::Thinking, format!("step {i}"), None);
        }
        for pair in log.entries().windows(2) {
            assert!(pair[0].timestamp <= pair[1].timestamp);
        }
    }

    #[test]
    fn counts_and_last() {
        let mut log = EventLog::new();
        let openai = ProviderId::from("openai");
        log.append(1, LogKind::Spawn, "spawn", Some(openai.clone()));
        log.append(1, LogKind::Spawn, "spawn", Some(ProviderId::from("kimi")));
        log.append(1, LogKind::Success, "done", Some(openai));
        assert_eq!(log.entries().iter().filter(|e| e.kind == LogKind::Spawn).count(), 2);
        assert_eq!(log.last().unwrap().kind, LogKind::Success);
    }

    #[test]
    fn clock_format() {
        let ts = UNIX_EPOCH + Duration::from_secs(86_400 * 3 + 3600 * 13 + 60 * 7 + 9);
        assert_eq!(format_clock(ts), "13:07:09");
    }

    #[test]
    fn kind_serializes_lowercase_as_type() {
        let mut log = EventLog::new();
        let entry = log
            .append(3, LogKind::Tool, "read_provider_doc", Some("openai".into()))
            .clone();
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["type"], "tool");
        assert_eq!(json["provider"], "openai");
        assert_eq!(json["run_id"], 3);
    }

    #[test]
    fn kind_display() {
        assert_eq!(LogKind::Spawn.to_string(), "spawn");
    }
}
