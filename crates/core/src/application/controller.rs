// Queue Controller - user intents
//
// Each intent: load -> validate/normalize -> mutate -> save -> publish.
// Mutating intents refuse to run on a failed read, so a transient storage
// error never saves an empty queue over the stored one.

use crate::application::change_bus::{ChangeBus, ChangeCause};
use crate::application::store::QueueStore;
use crate::domain::{normalize, AnnouncementScript, EntryId, NewEntry, QueueEntry, QueueList};
use crate::error::Result;
use crate::port::{Announcer, AudibleSignal, ConfirmationPrompt, IdProvider};
use std::sync::Arc;
use tracing::{debug, info};

/// Message shown before deleting an entry
pub const DELETE_CONFIRMATION: &str = "Yakin ingin menghapus antrean ini?";

/// Outcome of an intent addressed at an existing entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    /// The intent took effect
    Applied,
    /// The entry no longer exists (e.g. another view deleted it); nothing changed
    Stale,
    /// The user declined the confirmation; nothing changed
    Declined,
}

/// External collaborators a controller talks to
#[derive(Clone)]
pub struct Collaborators {
    pub confirmation: Arc<dyn ConfirmationPrompt>,
    pub announcer: Arc<dyn Announcer>,
    pub signal: Arc<dyn AudibleSignal>,
}

pub struct QueueController {
    store: Arc<QueueStore>,
    bus: Arc<ChangeBus>,
    id_provider: Arc<dyn IdProvider>,
    collaborators: Collaborators,
    shop_name: String,
}

impl QueueController {
    /// # Arguments
    /// * `store` - Queue store of this view
    /// * `bus` - Change bus of this view (local mutations are published here)
    /// * `id_provider` - Generates ids for new entries
    /// * `collaborators` - Confirmation prompt, announcer, audible signal
    /// * `shop_name` - Closing phrase of announcements
    pub fn new(
        store: Arc<QueueStore>,
        bus: Arc<ChangeBus>,
        id_provider: Arc<dyn IdProvider>,
        collaborators: Collaborators,
        shop_name: impl Into<String>,
    ) -> Self {
        Self {
            store,
            bus,
            id_provider,
            collaborators,
            shop_name: shop_name.into(),
        }
    }

    /// Register a customer at the tail of the queue with status `Queue`
    ///
    /// # Errors
    /// Validation error if any field is blank; nothing is persisted then.
    pub async fn add_entry(&self, customer: &str, motor: &str, nopol: &str) -> Result<QueueEntry> {
        let new_entry = NewEntry::new(customer, motor, nopol)?;

        let mut list = self.store.load_for_update().await?;
        let entry = new_entry.into_entry(EntryId::new(self.id_provider.generate_id()));
        list.push(entry.clone());
        self.commit(list).await?;

        info!(
            id = %entry.id,
            customer = %entry.customer,
            nopol = %entry.nopol,
            "Entry added to queue"
        );
        Ok(entry)
    }

    /// Overwrite an entry's status with the normalized `requested` value
    pub async fn set_status(&self, id: &EntryId, requested: &str) -> Result<Mutation> {
        let mut list = self.store.load_for_update().await?;
        let status = normalize(Some(requested));

        let Some(entry) = list.get_mut(id) else {
            debug!(id = %id, "set_status on missing entry ignored");
            return Ok(Mutation::Stale);
        };
        let previous = entry.status;
        entry.status = status;

        self.commit(list).await?;
        self.collaborators.signal.beep();

        info!(id = %id, from = %previous, to = %status, "Entry status changed");
        Ok(Mutation::Applied)
    }

    /// Remove an entry after the user confirms
    pub async fn delete_entry(&self, id: &EntryId) -> Result<Mutation> {
        if !self
            .collaborators
            .confirmation
            .confirm(DELETE_CONFIRMATION)
            .await
        {
            debug!(id = %id, "Delete declined");
            return Ok(Mutation::Declined);
        }

        let mut list = self.store.load_for_update().await?;
        let Some(removed) = list.remove(id) else {
            debug!(id = %id, "delete on missing entry ignored");
            return Ok(Mutation::Stale);
        };

        self.commit(list).await?;

        info!(id = %id, customer = %removed.customer, "Entry deleted");
        Ok(Mutation::Applied)
    }

    /// Call a customer to the cashier. Nothing is persisted.
    pub async fn announce(&self, id: &EntryId) -> Result<Mutation> {
        let list = self.store.load().await;
        let Some(entry) = list.get(id) else {
            debug!(id = %id, "announce on missing entry ignored");
            return Ok(Mutation::Stale);
        };

        let script = AnnouncementScript::for_entry(entry, &self.shop_name);
        self.collaborators.announcer.announce(&script).await?;

        info!(id = %id, customer = %entry.customer, "Announcement requested");
        Ok(Mutation::Applied)
    }

    /// Fresh copy of the stored queue
    pub async fn snapshot(&self) -> QueueList {
        self.store.load().await
    }

    /// Id of the entry currently displayed at `position` (0-based)
    pub async fn entry_at(&self, position: usize) -> Option<EntryId> {
        self.store.load().await.id_at(position).cloned()
    }

    async fn commit(&self, list: QueueList) -> Result<()> {
        self.store.save(&list).await?;
        self.bus.publish(list, ChangeCause::Local);
        Ok(())
    }
}
