//! Fundable Audit - Event sinks for fund-order notifications
//!
//! Every state-changing call publishes exactly one [`FundableEvent`] to each
//! registered [`EventSink`], after the change has committed. Two sinks ship
//! with this crate:
//!
//! - [`AuditLog`]: append-only, SHA-256 hash-chained, verifiable
//! - [`EventBus`]: fan-out to live subscribers over a broadcast channel

use std::sync::Arc;

use async_trait::async_trait;
use fundable_types::{FundableEvent, OperationId, TemporalAnchor};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::sync::{broadcast, RwLock};

/// Previous-hash value of the first entry in a chain
pub const GENESIS_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// Errors found while verifying the audit chain
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuditError {
    #[error("Audit entry {sequence} does not link to its predecessor")]
    BrokenLink { sequence: u64 },

    #[error("Audit entry {sequence} hash does not match its content")]
    HashMismatch { sequence: u64 },

    #[error("Audit entry {sequence} out of order, expected {expected}")]
    OutOfOrder { sequence: u64, expected: u64 },
}

pub type Result<T> = std::result::Result<T, AuditError>;

/// Receiver of fund-order notifications
///
/// Publishing is infallible from the caller's point of view: a sink that
/// cannot deliver must handle that itself.
///
/// `publish` runs while the publisher still holds its exclusive state
/// guard. A sink must not call back into the publishing service from inside
/// `publish`, or it deadlocks; hand the event off (for example through an
/// [`EventBus`] receiver) and act on it from another task.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn publish(&self, event: &FundableEvent);
}

/// An audit log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Position in the chain, starting at 0
    pub sequence: u64,
    /// Previous entry hash (for chain)
    pub previous_hash: String,
    /// Entry hash
    pub hash: String,
    /// When the event was recorded
    pub timestamp: TemporalAnchor,
    /// The recorded event
    pub event: FundableEvent,
}

impl AuditEntry {
    fn new(sequence: u64, previous_hash: String, event: FundableEvent) -> Self {
        let mut entry = Self {
            sequence,
            previous_hash,
            hash: String::new(),
            timestamp: TemporalAnchor::at_sequence(sequence),
            event,
        };
        entry.hash = entry.compute_hash();
        entry
    }

    /// Compute hash of this entry
    pub fn compute_hash(&self) -> String {
        let content = format!(
            "{}:{}:{}:{:?}",
            self.previous_hash, self.sequence, self.timestamp.timestamp, self.event
        );
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Verify the entry hash
    pub fn verify(&self) -> bool {
        self.hash == self.compute_hash()
    }
}

/// Append-only, hash-chained record of every published event
#[derive(Clone, Default)]
pub struct AuditLog {
    entries: Arc<RwLock<Vec<AuditEntry>>>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event, returning the new entry
    pub async fn append(&self, event: FundableEvent) -> AuditEntry {
        let mut entries = self.entries.write().await;
        let previous_hash = entries
            .last()
            .map(|e| e.hash.clone())
            .unwrap_or_else(|| GENESIS_HASH.to_string());
        let entry = AuditEntry::new(entries.len() as u64, previous_hash, event);
        entries.push(entry.clone());
        entry
    }

    /// All entries, oldest first
    pub async fn entries(&self) -> Vec<AuditEntry> {
        self.entries.read().await.clone()
    }

    /// Entries concerning one fund order, oldest first
    pub async fn entries_for_operation(&self, operation_id: &OperationId) -> Vec<AuditEntry> {
        let entries = self.entries.read().await;
        entries
            .iter()
            .filter(|e| e.event.operation_id() == Some(operation_id))
            .cloned()
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Verify the chain from genesis
    pub async fn verify_chain(&self) -> Result<()> {
        let entries = self.entries.read().await;
        verify_entries(&entries)
    }
}

/// Verify a sequence of entries forms an unbroken chain from genesis
pub fn verify_entries(entries: &[AuditEntry]) -> Result<()> {
    let mut previous = GENESIS_HASH;
    for (index, entry) in entries.iter().enumerate() {
        let expected = index as u64;
        if entry.sequence != expected {
            return Err(AuditError::OutOfOrder {
                sequence: entry.sequence,
                expected,
            });
        }
        if entry.previous_hash != previous {
            return Err(AuditError::BrokenLink {
                sequence: entry.sequence,
            });
        }
        if !entry.verify() {
            return Err(AuditError::HashMismatch {
                sequence: entry.sequence,
            });
        }
        previous = entry.hash.as_str();
    }
    Ok(())
}

#[async_trait]
impl EventSink for AuditLog {
    async fn publish(&self, event: &FundableEvent) {
        let entry = self.append(event.clone()).await;
        tracing::debug!(sequence = entry.sequence, event = event.name(), "audit entry appended");
    }
}

/// Live fan-out of events to subscribers
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<FundableEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FundableEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[async_trait]
impl EventSink for EventBus {
    async fn publish(&self, event: &FundableEvent) {
        // No subscribers is not a failure
        if self.sender.send(event.clone()).is_err() {
            tracing::trace!(event = event.name(), "no event subscribers");
        }
    }
}
