//! Mutation Lifecycle Tracking
//!
//! Optimistic mutations move through an explicit three-state lifecycle
//! (`Pending` while the network call is in flight, then `Committed` or
//! `RolledBack`) instead of ad hoc boolean flags, so tests and the UI can
//! observe the intermediate state.

use uuid::Uuid;

/// How many settled records to retain for inspection
const RETAINED_RECORDS: usize = 32;

/// State of one optimistic mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationPhase {
    /// Applied locally; network call not yet resolved
    Pending,
    /// Server confirmed the optimistic value
    Committed,
    /// Server rejected it; the local value was reverted
    RolledBack,
}

/// One tracked mutation
#[derive(Debug, Clone)]
pub struct MutationRecord {
    /// Token handed back by [`MutationLog::begin`]
    pub token: u64,
    /// The entity the mutation touched
    pub entity_id: Uuid,
    /// Current lifecycle phase
    pub phase: MutationPhase,
}

/// Append-only log of recent optimistic mutations
#[derive(Debug, Default)]
pub struct MutationLog {
    next_token: u64,
    records: Vec<MutationRecord>,
}

impl MutationLog {
    /// Record a new pending mutation, returning its token
    pub fn begin(&mut self, entity_id: Uuid) -> u64 {
        self.next_token += 1;
        let token = self.next_token;
        self.records.push(MutationRecord {
            token,
            entity_id,
            phase: MutationPhase::Pending,
        });
        if self.records.len() > RETAINED_RECORDS {
            self.records.remove(0);
        }
        token
    }

    /// Mark a mutation confirmed
    pub fn commit(&mut self, token: u64) {
        self.set_phase(token, MutationPhase::Committed);
    }

    /// Mark a mutation reverted
    pub fn roll_back(&mut self, token: u64) {
        self.set_phase(token, MutationPhase::RolledBack);
    }

    /// Phase of a tracked mutation, if still retained
    pub fn phase(&self, token: u64) -> Option<MutationPhase> {
        self.records
            .iter()
            .find(|record| record.token == token)
            .map(|record| record.phase)
    }

    /// Phase of the most recent mutation against one entity
    pub fn latest_for(&self, entity_id: Uuid) -> Option<MutationPhase> {
        self.records
            .iter()
            .rev()
            .find(|record| record.entity_id == entity_id)
            .map(|record| record.phase)
    }

    /// Whether any mutation is still awaiting its network resolution
    pub fn has_pending(&self) -> bool {
        self.records
            .iter()
            .any(|record| record.phase == MutationPhase::Pending)
    }

    fn set_phase(&mut self, token: u64, phase: MutationPhase) {
        if let Some(record) = self
            .records
            .iter_mut()
            .find(|record| record.token == token)
        {
            record.phase = phase;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_pending_to_committed() {
        let mut log = MutationLog::default();
        let id = Uuid::new_v4();
        let token = log.begin(id);
        assert_eq!(log.phase(token), Some(MutationPhase::Pending));
        assert!(log.has_pending());

        log.commit(token);
        assert_eq!(log.phase(token), Some(MutationPhase::Committed));
        assert!(!log.has_pending());
    }

    #[test]
    fn test_lifecycle_pending_to_rolled_back() {
        let mut log = MutationLog::default();
        let token = log.begin(Uuid::new_v4());
        log.roll_back(token);
        assert_eq!(log.phase(token), Some(MutationPhase::RolledBack));
    }

    #[test]
    fn test_latest_for_entity_wins() {
        let mut log = MutationLog::default();
        let id = Uuid::new_v4();
        let first = log.begin(id);
        log.commit(first);
        let _second = log.begin(id);
        assert_eq!(log.latest_for(id), Some(MutationPhase::Pending));
    }

    #[test]
    fn test_old_records_are_pruned() {
        let mut log = MutationLog::default();
        let first = log.begin(Uuid::new_v4());
        for _ in 0..RETAINED_RECORDS {
            let token = log.begin(Uuid::new_v4());
            log.commit(token);
        }
        assert!(log.phase(first).is_none());
    }
}
