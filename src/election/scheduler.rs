use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};
use rocket::tokio::sync::Mutex;

use crate::{
    error::{Error, Result},
    model::db::window::ElectionWindow,
    scheduled_task::ScheduledTask,
    store::SharedStore,
};

/// The single pending deactivation.
struct ArmedDeactivation {
    end: DateTime<Utc>,
    task: ScheduledTask<()>,
}

/// Owns the election window and the timer that closes it.
///
/// Writing the window and arming its timer happen under one lock, so a timer
/// never races a window that has not been committed yet. Each arm bumps a
/// generation counter; a timer only writes if it is still the latest, and the
/// write itself only applies if the stored window still ends when it expects.
pub struct ElectionScheduler {
    store: SharedStore,
    armed: Mutex<Option<ArmedDeactivation>>,
    generation: Arc<AtomicU64>,
}

impl ElectionScheduler {
    pub fn new(store: SharedStore) -> Self {
        Self {
            store,
            armed: Mutex::new(None),
            generation: Default::default(),
        }
    }

    /// Persist a new window, replacing any previous one, and arm its deactivation.
    pub async fn set_window(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<ElectionWindow> {
        let window = ElectionWindow::new(start, end, Utc::now());
        if window.start >= window.end {
            return Err(Error::BadRequest(format!(
                "election window must start before it ends (got {} to {})",
                window.start, window.end
            )));
        }

        let mut armed = self.armed.lock().await;
        self.store
            .put_window(&window)
            .await
            .map_err(Error::persistence("save election window"))?;
        info!(
            "Election window set to {} - {} (active: {})",
            window.start, window.end, window.active
        );
        self.arm_locked(&mut armed, window.end).await;
        Ok(window)
    }

    /// The persisted window.
    pub async fn current_window(&self) -> Result<ElectionWindow> {
        self.store
            .window()
            .await
            .map_err(Error::persistence("load election window"))?
            .ok_or(Error::NotConfigured)
    }

    /// Ensure the window ending at `end` is deactivated once `end` is reached.
    /// If `end` has already passed, the deactivation happens before this returns.
    pub async fn arm_deactivation(&self, end: DateTime<Utc>) {
        let mut armed = self.armed.lock().await;
        self.arm_locked(&mut armed, end).await;
    }

    /// Re-derive the timer from persisted state. Call once, before serving votes.
    pub async fn recover_on_startup(&self) -> Result<()> {
        let window = self
            .store
            .window()
            .await
            .map_err(Error::persistence("load election window"))?;
        match window {
            Some(window) if window.active => {
                info!("Recovering deactivation for election ending {}", window.end);
                self.arm_deactivation(window.end).await;
            }
            Some(_) => debug!("Election window is inactive; nothing to schedule"),
            None => debug!("No election window configured; nothing to schedule"),
        }
        Ok(())
    }

    /// Is a deactivation currently pending for `end`?
    #[cfg(test)]
    pub async fn is_armed_for(&self, end: DateTime<Utc>) -> bool {
        matches!(&*self.armed.lock().await, Some(armed) if armed.end == end && !armed.task.is_finished())
    }

    async fn arm_locked(&self, armed: &mut Option<ArmedDeactivation>, end: DateTime<Utc>) {
        let end = end.trunc_subsecs(0);
        if let Some(current) = armed.as_ref() {
            if current.end == end && !current.task.is_finished() {
                debug!("Deactivation for {end} already armed");
                return;
            }
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(previous) = armed.take() {
            if !previous.task.cancel().await {
                debug!("Superseded deactivation timer for {}", previous.end);
            }
        }

        let deactivation = deactivate(self.store.clone(), self.generation.clone(), generation, end);
        if end <= Utc::now() {
            info!("Election end {end} has already passed, deactivating now");
            deactivation.await;
            return;
        }
        info!("Armed election deactivation for {end}");
        *armed = Some(ArmedDeactivation {
            end,
            task: ScheduledTask::new(deactivation, end),
        });
    }
}

/// Mark the window ending at `end` inactive, unless a newer timer has been armed since.
/// Failures are logged and not retried.
async fn deactivate(
    store: SharedStore,
    latest: Arc<AtomicU64>,
    generation: u64,
    end: DateTime<Utc>,
) {
    if latest.load(Ordering::SeqCst) != generation {
        debug!("Stale deactivation timer for {end} skipped");
        return;
    }
    match store.deactivate_window(end).await {
        Ok(true) => info!("Election window ending {end} deactivated"),
        Ok(false) => debug!("Election window ending {end} was already inactive or replaced"),
        Err(e) => error!("Failed to deactivate election window ending {end}: {e}"),
    }
}
