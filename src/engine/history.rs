// Beans Engine — Chat History
// In-memory, append-only conversation history. One instance per WebSocket
// connection; created empty when the socket opens, dropped when it closes.
// Single logical writer, so no locking — each connection processes its
// messages strictly in sequence.

use crate::engine::types::Message;

#[derive(Debug, Default)]
pub struct ChatHistory {
    messages: Vec<Message>,
}

impl ChatHistory {
    pub fn new() -> Self {
        ChatHistory { messages: Vec::new() }
    }

    /// Append to the end of the sequence. Entries are never removed or
    /// reordered; order is chronological turn order.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// The last `n` entries in original order. Used to bound the context
    /// sent to the live responder.
    pub fn recent(&self, n: usize) -> &[Message] {
        let start = self.messages.len().saturating_sub(n);
        &self.messages[start..]
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::types::Role;

    #[test]
    fn test_turn_pairs_alternate() {
        let mut h = ChatHistory::new();
        for i in 0..4 {
            h.push(Message::user(format!("question {i}")));
            h.push(Message::assistant(format!("answer {i}")));
        }
        // After N pairs: exactly 2N entries in strict alternation.
        assert_eq!(h.len(), 8);
        for (i, m) in h.recent(8).iter().enumerate() {
            let want = if i % 2 == 0 { Role::User } else { Role::Assistant };
            assert_eq!(m.role, want, "entry {i}");
        }
    }

    #[test]
    fn test_recent_keeps_original_order() {
        let mut h = ChatHistory::new();
        for i in 0..12 {
            h.push(Message::user(i.to_string()));
        }
        let tail: Vec<&str> = h.recent(3).iter().map(|m| m.content.as_str()).collect();
        assert_eq!(tail, ["9", "10", "11"]);
    }

    #[test]
    fn test_recent_larger_than_len() {
        let mut h = ChatHistory::new();
        h.push(Message::user("only"));
        assert_eq!(h.recent(10).len(), 1);
        assert!(ChatHistory::new().recent(10).is_empty());
    }
}
