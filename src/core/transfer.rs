use crate::core::domain::{DomainId, ExecutionDomain};
use crate::core::isolated::Isolated;
use crate::utils::error::LabError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Per-value transfer state.
///
/// `Owned -> Rejected` or `Owned -> Transferred -> Received`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferState {
    Owned,
    Rejected,
    Transferred,
    Received,
}

impl TransferState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransferState::Rejected | TransferState::Received)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRecord {
    pub transfer_id: u64,
    pub from: DomainId,
    pub to: Option<DomainId>,
    pub state: TransferState,
    pub at: DateTime<Utc>,
    pub reason: Option<String>,
}

/// 可審計的轉移紀錄，所有跨 domain 的所有權交接都會寫入
#[derive(Debug, Clone, Default)]
pub struct TransferLog {
    next_id: Arc<AtomicU64>,
    records: Arc<Mutex<Vec<TransferRecord>>>,
}

impl TransferLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub(crate) fn record(
        &self,
        transfer_id: u64,
        from: DomainId,
        to: Option<DomainId>,
        state: TransferState,
        reason: Option<String>,
    ) {
        tracing::debug!(
            "🔀 transfer #{} {} -> {:?}: {:?}",
            transfer_id,
            from,
            to,
            state
        );
        let record = TransferRecord {
            transfer_id,
            from,
            to,
            state,
            at: Utc::now(),
            reason,
        };
        match self.records.lock() {
            Ok(mut records) => records.push(record),
            Err(poisoned) => poisoned.into_inner().push(record),
        }
    }

    pub fn records(&self) -> Vec<TransferRecord> {
        match self.records.lock() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn count(&self, state: TransferState) -> usize {
        self.records().iter().filter(|r| r.state == state).count()
    }

    /// Latest state recorded for one transfer.
    pub fn state_of(&self, transfer_id: u64) -> Option<TransferState> {
        self.records()
            .iter()
            .rev()
            .find(|r| r.transfer_id == transfer_id)
            .map(|r| r.state)
    }
}

/// Move-only handle for a value in flight between two domains.
///
/// The sender gave up its `Isolated<T>` to build this, so nothing on the
/// sending side can reach the value any more.
pub struct Transfer<T> {
    id: u64,
    from: DomainId,
    value: T,
    log: TransferLog,
}

impl<T: Send> Transfer<T> {
    pub(crate) fn new(id: u64, from: DomainId, value: T, log: TransferLog) -> Self {
        Self {
            id,
            from,
            value,
            log,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn from_domain(&self) -> DomainId {
        self.from
    }

    /// Rebinds the value to the receiving domain.
    pub fn receive<D: ExecutionDomain>(self, receiver: &D) -> Isolated<T> {
        let to = receiver.domain_id();
        self.log
            .record(self.id, self.from, Some(to), TransferState::Received, None);
        Isolated::new(self.value, receiver)
    }
}

impl<T> fmt::Debug for Transfer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transfer")
            .field("id", &self.id)
            .field("from", &self.from)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    NotOwner { owner: DomainId, sender: DomainId },
    StillReferenced { aliases: usize },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::NotOwner { owner, sender } => {
                write!(f, "{} cannot hand off a value owned by {}", sender, owner)
            }
            RejectReason::StillReferenced { aliases } => {
                write!(f, "{} other alias(es) still reference the value", aliases)
            }
        }
    }
}

/// A refused transfer. The value goes back to its owner untouched.
pub struct Rejected<T> {
    pub value: Isolated<T>,
    pub reason: RejectReason,
}

impl<T> fmt::Debug for Rejected<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rejected")
            .field("owner", &self.value.owner())
            .field("reason", &self.reason)
            .finish()
    }
}

impl<T> From<Rejected<T>> for LabError {
    fn from(rejected: Rejected<T>) -> Self {
        LabError::TransferRejected {
            reason: rejected.reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::domain::Nonisolated;

    #[test]
    fn test_terminal_states() {
        assert!(!TransferState::Owned.is_terminal());
        assert!(!TransferState::Transferred.is_terminal());
        assert!(TransferState::Rejected.is_terminal());
        assert!(TransferState::Received.is_terminal());
    }

    #[test]
    fn test_log_tracks_latest_state() {
        let log = TransferLog::new();
        let id = log.next_id();
        log.record(id, DomainId::Main, None, TransferState::Transferred, None);
        log.record(
            id,
            DomainId::Main,
            Some(DomainId::Nonisolated),
            TransferState::Received,
            None,
        );

        assert_eq!(log.state_of(id), Some(TransferState::Received));
        assert_eq!(log.count(TransferState::Transferred), 1);
        assert_eq!(log.records().len(), 2);
        assert_eq!(log.state_of(id + 1), None);
    }

    #[test]
    fn test_receive_rebinds_owner() {
        let log = TransferLog::new();
        let token = Nonisolated::new();
        let transfer = Transfer::new(log.next_id(), DomainId::Main, vec![1, 2, 3], log.clone());
        assert_eq!(transfer.from_domain(), DomainId::Main);

        let owned = transfer.receive(&token);
        assert_eq!(owned.owner(), DomainId::Nonisolated);
        assert_eq!(owned.with(&token, |v| v.len()).unwrap(), 3);
        assert_eq!(log.count(TransferState::Received), 1);
    }

    #[test]
    fn test_rejection_converts_to_error() {
        let token = Nonisolated::new();
        let rejected = Rejected {
            value: Isolated::new(5u8, &token),
            reason: RejectReason::StillReferenced { aliases: 2 },
        };
        let err: LabError = rejected.into();
        assert!(err.to_string().contains("2 other alias(es)"));
    }
}
