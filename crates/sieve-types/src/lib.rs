//! Shared types for the sieve analysis pipeline.
//!
//! This crate provides the leaf types used across all sieve crates: the
//! opaque [`Event`] routed between analyzers, the identifiers of analyzers
//! and sources, and the [`Origin`] tag that tells the router who produced
//! an event.
//!
//! Only plain data lives here. Error types and the logging sink belong to
//! the crates that own them: `sieve-engine` exports `EngineError`,
//! `sieve-observe` the shared sink and its `Severity`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A decoded protocol message travelling through the analyzer graph.
///
/// The engine routes events but never interprets them. `type_id` is the
/// message type label assigned by the decoder (e.g. `"LTE_RRC_OTA_Packet"`),
/// `data` is the decoded payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// The message type label.
    pub type_id: String,
    /// When the message was captured, if the source knows it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    /// The decoded payload.
    #[serde(default)]
    pub data: serde_json::Value,
}

impl Event {
    /// Creates an event without a capture timestamp.
    pub fn new(type_id: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            type_id: type_id.into(),
            timestamp: None,
            data,
        }
    }

    /// Sets the capture timestamp.
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

/// Identifies one live analyzer inside an engine.
///
/// The `epoch` ties the id to one generation of the registry; ids issued
/// before a reset never resolve to analyzers created after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AnalyzerId {
    index: u32,
    epoch: u32,
}

impl AnalyzerId {
    /// Creates an id from a registry slot and generation.
    pub fn new(index: u32, epoch: u32) -> Self {
        Self { index, epoch }
    }

    /// Returns the registry slot.
    pub fn index(self) -> u32 {
        self.index
    }

    /// Returns the registry generation the id belongs to.
    pub fn epoch(self) -> u32 {
        self.epoch
    }
}

impl std::fmt::Display for AnalyzerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "analyzer#{}.{}", self.index, self.epoch)
    }
}

/// Identifies an event-producing source registered with an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceId(pub u32);

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "source#{}", self.0)
    }
}

/// Who handed an event to an analyzer.
///
/// The caller resolves the origin before dispatch, so the router never has
/// to compare sender identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Origin {
    /// Top-level ingestion from the source the analyzer is bound to.
    Source(SourceId),
    /// Re-emission by an analyzer the receiver depends on.
    Producer(AnalyzerId),
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Source(id) => write!(f, "{id}"),
            Self::Producer(id) => write!(f, "{id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn event_deserialises_without_optional_fields() {
        let event: Event =
            serde_json::from_str(r#"{"type_id":"LTE_RRC_OTA_Packet"}"#).expect("should parse");
        assert_eq!(event.type_id, "LTE_RRC_OTA_Packet");
        assert_eq!(event.timestamp, None);
        assert_eq!(event.data, serde_json::Value::Null);
    }

    #[test]
    fn event_keeps_timestamp_and_payload() {
        let ts = Utc
            .with_ymd_and_hms(2016, 3, 1, 12, 0, 0)
            .single()
            .expect("valid timestamp");
        let event = Event::new("WCDMA_RRC_OTA_Packet", json!({"rrc": "setup"})).at(ts);

        let text = serde_json::to_string(&event).expect("should serialise");
        let back: Event = serde_json::from_str(&text).expect("should parse");
        assert_eq!(back, event);
    }

    #[test]
    fn analyzer_ids_differ_across_epochs() {
        let before = AnalyzerId::new(0, 0);
        let after = AnalyzerId::new(0, 1);
        assert_ne!(before, after);
        assert_eq!(before.index(), after.index());
        assert_eq!(after.to_string(), "analyzer#0.1");
    }

    #[test]
    fn origin_display_names_the_sender() {
        assert_eq!(Origin::Source(SourceId(2)).to_string(), "source#2");
        assert_eq!(
            Origin::Producer(AnalyzerId::new(4, 0)).to_string(),
            "analyzer#4.0"
        );
    }
}
