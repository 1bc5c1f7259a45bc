#[cfg(test)]
#[path = "history_test.rs"]
mod tests;

use serde_derive::Deserialize;
use serde_derive::Serialize;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
    System,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: ChatRole,
    pub content: String,
}

impl HistoryEntry {
    pub fn new(role: ChatRole, content: &str) -> HistoryEntry {
        return HistoryEntry {
            role,
            content: content.to_string(),
        };
    }
}

/// Append-only view of a caller owned conversation log. The chat client reads
/// every entry for the handshake and appends the user's turn, but never
/// removes or reorders anything.
pub trait HistoryLog {
    fn entries(&self) -> &[HistoryEntry];
    fn append(&mut self, role: ChatRole, content: &str);
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationHistory {
    entries: Vec<HistoryEntry>,
}

impl ConversationHistory {
    pub fn new() -> ConversationHistory {
        return ConversationHistory::default();
    }

    pub fn len(&self) -> usize {
        return self.entries.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.entries.is_empty();
    }

    pub fn last(&self) -> Option<&HistoryEntry> {
        return self.entries.last();
    }
}

impl HistoryLog for ConversationHistory {
    fn entries(&self) -> &[HistoryEntry] {
        return &self.entries;
    }

    fn append(&mut self, role: ChatRole, content: &str) {
        self.entries.push(HistoryEntry::new(role, content));
    }
}
