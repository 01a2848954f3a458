// Tiga Watch — Chat Link
//
// Local side of the phone chat.  Only the message log and the link status
// are implemented: outgoing text is recorded but never transmitted, and the
// link counts as connected as soon as anything is received from a peer.

use crate::config::*;
use crate::ring::BoundedLog;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// Looking for the phone app.
    Scanning,
    Connected,
    /// Radio bring-up failed.
    Error,
}

impl LinkState {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Scanning => "Looking for phone...",
            Self::Connected => "Connected",
            Self::Error => "Connection Error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Incoming,
    Outgoing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// At most [`CHAT_MAX_TEXT_LEN`] bytes.
    pub text: String,
    pub timestamp_ms: u64,
    pub direction: Direction,
}

impl ChatMessage {
    /// Human-readable age, e.g. "12s ago" or "3m ago".
    pub fn age_label(&self, now_ms: u64) -> String {
        let secs = now_ms.saturating_sub(self.timestamp_ms) / 1000;
        if secs < 60 {
            format!("{}s ago", secs)
        } else {
            format!("{}m ago", secs / 60)
        }
    }
}

pub struct ChatLink {
    state: LinkState,
    messages: BoundedLog<ChatMessage, CHAT_MAX_MESSAGES>,
    last_scan_ms: u64,
}

impl ChatLink {
    pub fn new() -> Self {
        Self {
            state: LinkState::Scanning,
            messages: BoundedLog::new(),
            last_scan_ms: 0,
        }
    }

    /// The radio failed to start.  The link stays in [`LinkState::Error`]
    /// until a peer message arrives anyway.
    pub fn mark_failed(&mut self) {
        log::warn!("Chat link unavailable");
        self.state = LinkState::Error;
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == LinkState::Connected
    }

    /// Periodic housekeeping from the control loop.  Returns `true` when a
    /// scan pass ran.
    pub fn tick(&mut self, now_ms: u64) -> bool {
        if self.state == LinkState::Scanning
            && now_ms.saturating_sub(self.last_scan_ms) > CHAT_SCAN_INTERVAL_MS
        {
            // Peer discovery is not implemented; incoming traffic is the only
            // way the link comes up.
            log::debug!("Chat: scanning for phone");
            self.last_scan_ms = now_ms;
            true
        } else {
            false
        }
    }

    /// Record a locally composed message.
    pub fn send(&mut self, now_ms: u64, text: &str) {
        let text = truncate_utf8(text, CHAT_MAX_TEXT_LEN).to_owned();
        log::info!("Chat out: {}", text);
        self.push(ChatMessage {
            text,
            timestamp_ms: now_ms,
            direction: Direction::Outgoing,
        });
    }

    /// Record a payload handed over by the radio.
    pub fn receive(&mut self, now_ms: u64, payload: &[u8]) {
        let payload = &payload[..payload.len().min(CHAT_MAX_TEXT_LEN)];
        let text = String::from_utf8_lossy(payload);
        // Lossy replacement characters can push the text past the limit.
        let text = truncate_utf8(&text, CHAT_MAX_TEXT_LEN).to_owned();
        log::info!("Chat in: {}", text);
        self.push(ChatMessage {
            text,
            timestamp_ms: now_ms,
            direction: Direction::Incoming,
        });

        if self.state != LinkState::Connected {
            log::info!("Chat link connected");
            self.state = LinkState::Connected;
        }
    }

    fn push(&mut self, message: ChatMessage) {
        if let Some(dropped) = self.messages.push(message) {
            log::debug!("Chat log full, dropped message from {} ms", dropped.timestamp_ms);
        }
    }

    pub fn messages(&self) -> &BoundedLog<ChatMessage, CHAT_MAX_MESSAGES> {
        &self.messages
    }

    /// The newest `k` messages, oldest first.
    pub fn recent(&self, k: usize) -> impl DoubleEndedIterator<Item = &ChatMessage> + '_ {
        self.messages.recent(k)
    }
}

impl Default for ChatLink {
    fn default() -> Self {
        Self::new()
    }
}

/// Longest prefix of `s` that fits in `max` bytes without splitting a char.
pub fn truncate_utf8(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
