//! Request History Domain Model
//!
//! Defines the append-only, FIFO-capped log of executed requests.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::request::RequestSpec;
use crate::response::ResponseSpec;

/// A single entry in the request history.
///
/// One entry is produced for every send attempt, successful or not;
/// each response record belongs to exactly one entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Unique identifier for this entry.
    pub id: String,
    /// When the request was executed.
    pub timestamp: DateTime<Utc>,
    /// The resolved request snapshot that was sent.
    pub request: RequestSpec,
    /// The normalized response record.
    pub response: Option<ResponseSpec>,
    /// Whether the attempt succeeded (2xx status).
    pub success: bool,
}

impl HistoryEntry {
    /// Creates a history entry for a completed attempt.
    ///
    /// The success flag is derived from the response status; transport
    /// failures (status 0) are recorded as unsuccessful.
    #[must_use]
    pub fn completed(request: RequestSpec, response: ResponseSpec) -> Self {
        let success = response.is_success();
        Self {
            id: crate::generate_id(),
            timestamp: Utc::now(),
            request,
            response: Some(response),
            success,
        }
    }

    /// Returns a human-readable "time ago" string.
    #[must_use]
    pub fn time_ago(&self) -> String {
        let now = Utc::now();
        let duration = now.signed_duration_since(self.timestamp);

        if duration.num_seconds() < 60 {
            "just now".to_string()
        } else if duration.num_minutes() < 60 {
            let mins = duration.num_minutes();
            format!("{mins}m ago")
        } else if duration.num_hours() < 24 {
            let hours = duration.num_hours();
            format!("{hours}h ago")
        } else if duration.num_days() < 7 {
            let days = duration.num_days();
            format!("{days}d ago")
        } else {
            self.timestamp.format("%Y-%m-%d").to_string()
        }
    }
}

fn default_max_entries() -> usize {
    100
}

/// Request history with a maximum size limit.
///
/// Entries are kept newest first; once the cap is reached the oldest
/// entries are evicted from the tail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestHistory {
    /// History entries (newest first).
    entries: VecDeque<HistoryEntry>,
    /// Maximum number of entries to keep.
    #[serde(default = "default_max_entries")]
    max_entries: usize,
}

impl RequestHistory {
    /// Creates a new empty history with the given cap.
    #[must_use]
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            max_entries,
        }
    }

    /// Adds an entry to the front of the history, evicting from the tail.
    pub fn add(&mut self, entry: HistoryEntry) {
        self.entries.push_front(entry);

        while self.entries.len() > self.max_entries {
            self.entries.pop_back();
        }
    }

    /// Returns all entries (newest first).
    #[must_use]
    pub const fn entries(&self) -> &VecDeque<HistoryEntry> {
        &self.entries
    }

    /// Returns an entry by ID.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&HistoryEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Removes an entry by ID; returns whether it existed.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    /// Clears all history entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if history is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the configured maximum number of entries.
    #[must_use]
    pub const fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Sets the maximum number of entries and trims if needed.
    pub fn set_max_entries(&mut self, max: usize) {
        self.max_entries = max;
        while self.entries.len() > max {
            self.entries.pop_back();
        }
    }
}

impl Default for RequestHistory {
    fn default() -> Self {
        Self::new(default_max_entries())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;

    fn entry_for(url: &str, status: u16) -> HistoryEntry {
        let request = RequestSpec::get(url);
        let response = ResponseSpec::new(
            status,
            "",
            HashMap::new(),
            b"{}".to_vec(),
            Duration::from_millis(10),
        );
        HistoryEntry::completed(request, response)
    }

    #[test]
    fn test_entry_success_from_status() {
        let ok = entry_for("https://example.com", 200);
        assert!(ok.success);

        let not_found = entry_for("https://example.com", 404);
        assert!(!not_found.success);
    }

    #[test]
    fn test_entry_for_network_error_is_failure() {
        let request = RequestSpec::get("https://unreachable.invalid");
        let response = ResponseSpec::network_error("dns failure", Duration::ZERO);
        let entry = HistoryEntry::completed(request, response);

        assert!(!entry.success);
        assert!(entry.response.is_some());
    }

    #[test]
    fn test_history_max_entries_fifo() {
        let mut history = RequestHistory::new(3);

        for i in 0..5 {
            history.add(entry_for(&format!("https://example.com/{i}"), 200));
        }

        assert_eq!(history.len(), 3);
        // Newest first; the two oldest were evicted.
        assert!(history.entries()[0].request.url.ends_with("/4"));
        assert!(history.entries()[2].request.url.ends_with("/2"));
    }

    #[test]
    fn test_history_get_and_remove() {
        let mut history = RequestHistory::new(10);
        let entry = entry_for("https://example.com", 200);
        let id = entry.id.clone();
        history.add(entry);

        assert!(history.get(&id).is_some());
        assert!(history.remove(&id));
        assert!(!history.remove(&id));
        assert!(history.is_empty());
    }

    #[test]
    fn test_set_max_entries_trims() {
        let mut history = RequestHistory::new(10);
        for i in 0..6 {
            history.add(entry_for(&format!("https://example.com/{i}"), 200));
        }

        history.set_max_entries(2);
        assert_eq!(history.len(), 2);
        assert!(history.entries()[0].request.url.ends_with("/5"));
    }
}
