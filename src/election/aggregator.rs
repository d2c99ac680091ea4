use crate::{
    error::{Error, Result},
    model::common::{department::Department, election::CandidateKey},
    store::SharedStore,
};

/// Durable per-candidate, per-department vote counters.
#[derive(Clone)]
pub struct TallyAggregator {
    store: SharedStore,
}

impl TallyAggregator {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Add one vote for `key` in `department`, creating the counters on first use.
    pub async fn increment(&self, key: &CandidateKey, department: Department) -> Result<()> {
        self.store
            .increment_tally(key, department)
            .await
            .map_err(Error::persistence("record vote"))?;
        trace!("Counted a {department} vote for {key}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rocket::futures::future::join_all;

    use super::*;
    use crate::store::{ElectionStore, MemoryStore};

    #[rocket::async_test]
    async fn concurrent_increments_are_all_counted() {
        let store = MemoryStore::default();
        let aggregator = TallyAggregator::new(Arc::new(store.clone()));
        let key = CandidateKey::new("Governor", "Alice");

        let increments = (0..50).map(|i| {
            let aggregator = aggregator.clone();
            let key = key.clone();
            let department = Department::ALL[i % Department::ALL.len()];
            async move { aggregator.increment(&key, department).await }
        });
        for result in join_all(increments).await {
            result.unwrap();
        }

        let tally = store.tally(&key).await.unwrap().unwrap();
        assert_eq!(tally.counts.to_vector(), [10; 5]);
        assert_eq!(tally.total(), 50);
    }

    #[rocket::async_test]
    async fn store_failure_is_a_persistence_error() {
        let store = MemoryStore::default();
        let aggregator = TallyAggregator::new(Arc::new(store.clone()));
        store.set_fail_writes(true);

        let result = aggregator
            .increment(&CandidateKey::new("Governor", "Alice"), Department::Cit)
            .await;
        assert!(matches!(
            result,
            Err(Error::Persistence {
                operation: "record vote",
                ..
            })
        ));
    }
}
