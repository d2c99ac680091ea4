use std::collections::HashMap;
#[cfg(test)]
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use crate::model::{
    common::{
        department::Department,
        election::{CandidateKey, VoterId},
    },
    db::{
        admin::Admin,
        candidate::Candidate,
        tally::{CandidateTally, DepartmentCounts},
        voter::Voter,
        window::ElectionWindow,
    },
};

use super::{ElectionStore, StoreError, StoreResult};

#[derive(Debug, Default)]
struct MemoryState {
    window: Option<ElectionWindow>,
    voters: HashMap<VoterId, Voter>,
    candidates: HashMap<CandidateKey, Candidate>,
    tallies: HashMap<CandidateKey, DepartmentCounts>,
    admins: HashMap<String, Admin>,
}

/// A process-local store. Every operation runs under one lock, so conditional
/// writes and increments are trivially atomic. Cloning shares the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    #[cfg(test)]
    fail_writes: Arc<AtomicBool>,
}

impl MemoryStore {
    fn lock(&self) -> StoreResult<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }

    fn lock_for_write(&self) -> StoreResult<MutexGuard<'_, MemoryState>> {
        #[cfg(test)]
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("writes disabled".to_string()));
        }
        self.lock()
    }

    /// Make every subsequent write fail until re-enabled.
    #[cfg(test)]
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[rocket::async_trait]
impl ElectionStore for MemoryStore {
    async fn window(&self) -> StoreResult<Option<ElectionWindow>> {
        Ok(self.lock()?.window.clone())
    }

    async fn put_window(&self, window: &ElectionWindow) -> StoreResult<()> {
        self.lock_for_write()?.window = Some(window.clone());
        Ok(())
    }

    async fn deactivate_window(&self, end: DateTime<Utc>) -> StoreResult<bool> {
        let mut state = self.lock_for_write()?;
        match state.window.as_mut() {
            Some(window) if window.active && window.end == end => {
                window.active = false;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn voter(&self, id: &str) -> StoreResult<Option<Voter>> {
        Ok(self.lock()?.voters.get(id).cloned())
    }

    async fn insert_voter(&self, voter: &Voter) -> StoreResult<bool> {
        let mut state = self.lock_for_write()?;
        if state.voters.contains_key(&voter.id) {
            return Ok(false);
        }
        state.voters.insert(voter.id.clone(), voter.clone());
        Ok(true)
    }

    async fn claim_voter(&self, id: &str) -> StoreResult<bool> {
        let mut state = self.lock_for_write()?;
        match state.voters.get_mut(id) {
            Some(voter) if !voter.has_voted => {
                voter.has_voted = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn candidate(&self, key: &CandidateKey) -> StoreResult<Option<Candidate>> {
        Ok(self.lock()?.candidates.get(key).cloned())
    }

    async fn candidates(&self) -> StoreResult<Vec<Candidate>> {
        Ok(self.lock()?.candidates.values().cloned().collect())
    }

    async fn insert_candidate(&self, candidate: &Candidate) -> StoreResult<bool> {
        let mut state = self.lock_for_write()?;
        let key = candidate.key();
        if state.candidates.contains_key(&key) {
            return Ok(false);
        }
        state.candidates.insert(key, candidate.clone());
        Ok(true)
    }

    async fn increment_tally(
        &self,
        key: &CandidateKey,
        department: Department,
    ) -> StoreResult<()> {
        self.lock_for_write()?
            .tallies
            .entry(key.clone())
            .or_default()
            .increment(department);
        Ok(())
    }

    async fn tally(&self, key: &CandidateKey) -> StoreResult<Option<CandidateTally>> {
        Ok(self.lock()?.tallies.get(key).map(|counts| CandidateTally {
            key: key.clone(),
            counts: *counts,
        }))
    }

    async fn tallies(&self) -> StoreResult<Vec<CandidateTally>> {
        Ok(self
            .lock()?
            .tallies
            .iter()
            .map(|(key, counts)| CandidateTally {
                key: key.clone(),
                counts: *counts,
            })
            .collect())
    }

    async fn admin(&self, username: &str) -> StoreResult<Option<Admin>> {
        Ok(self.lock()?.admins.get(username).cloned())
    }

    async fn insert_admin(&self, admin: &Admin) -> StoreResult<bool> {
        let mut state = self.lock_for_write()?;
        if state.admins.contains_key(&admin.username) {
            return Ok(false);
        }
        state.admins.insert(admin.username.clone(), admin.clone());
        Ok(true)
    }

    async fn admin_count(&self) -> StoreResult<u64> {
        Ok(self.lock()?.admins.len() as u64)
    }
}


#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[rocket::async_test]
    async fn claim_voter_only_once() {
        let store = MemoryStore::default();
        assert!(!store.claim_voter("nobody").await.unwrap());

        let voter = Voter::example();
        assert!(store.insert_voter(&voter).await.unwrap());
        assert!(!store.insert_voter(&voter).await.unwrap());

        assert!(store.claim_voter(&voter.id).await.unwrap());
        assert!(!store.claim_voter(&voter.id).await.unwrap());
        assert!(store.voter(&voter.id).await.unwrap().unwrap().has_voted);
    }

    #[rocket::async_test]
    async fn deactivate_only_matching_window() {
        let store = MemoryStore::default();
        let now = Utc::now();
        let window = ElectionWindow::new(now - Duration::hours(1), now + Duration::hours(1), now);
        assert!(!store.deactivate_window(window.end).await.unwrap());

        store.put_window(&window).await.unwrap();
        assert!(!store
            .deactivate_window(window.end + Duration::seconds(1))
            .await
            .unwrap());
        assert!(store.window().await.unwrap().unwrap().active);

        assert!(store.deactivate_window(window.end).await.unwrap());
        assert!(!store.window().await.unwrap().unwrap().active);
        assert!(!store.deactivate_window(window.end).await.unwrap());
    }

    #[rocket::async_test]
    async fn failing_writes_leave_data_untouched() {
        let store = MemoryStore::default();
        let key = CandidateKey::new("Governor", "Alice");
        store.increment_tally(&key, Department::Coe).await.unwrap();

        store.set_fail_writes(true);
        assert!(matches!(
            store.increment_tally(&key, Department::Coe).await,
            Err(StoreError::Unavailable(_))
        ));
        store.set_fail_writes(false);

        let tally = store.tally(&key).await.unwrap().unwrap();
        assert_eq!(tally.total(), 1);
    }
}
