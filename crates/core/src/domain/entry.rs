// Queue Entry Domain Model

use super::error::{DomainError, Result};
use super::status::Status;
use serde::{Deserialize, Serialize};

/// Stable entry identifier (UUID v4 in production, injected via `IdProvider`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(String);

impl EntryId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Legacy records written without an id deserialize to an empty one
    pub fn is_unassigned(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validated customer input for a new queue entry
///
/// All three fields are trimmed and guaranteed non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    customer: String,
    motor: String,
    nopol: String,
}

impl NewEntry {
    /// Validate raw form input
    ///
    /// # Errors
    /// `DomainError::Validation` naming every blank field
    pub fn new(customer: &str, motor: &str, nopol: &str) -> Result<Self> {
        let customer = customer.trim();
        let motor = motor.trim();
        let nopol = nopol.trim();

        let missing: Vec<&str> = [("customer", customer), ("motor", motor), ("nopol", nopol)]
            .into_iter()
            .filter(|(_, value)| value.is_empty())
            .map(|(name, _)| name)
            .collect();

        if !missing.is_empty() {
            return Err(DomainError::Validation(format!(
                "all fields are required, missing: {}",
                missing.join(", ")
            )));
        }

        Ok(Self {
            customer: customer.to_string(),
            motor: motor.to_string(),
            nopol: nopol.to_string(),
        })
    }

    /// Turn validated input into a queue entry with the default status
    pub fn into_entry(self, id: EntryId) -> QueueEntry {
        QueueEntry {
            id,
            customer: self.customer,
            motor: self.motor,
            nopol: self.nopol,
            status: Status::Queue,
        }
    }
}

/// One customer's service record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    #[serde(default, skip_serializing_if = "EntryId::is_unassigned")]
    pub id: EntryId,
    pub customer: String,
    pub motor: String,
    /// License plate
    pub nopol: String,
    #[serde(default)]
    pub status: Status,
}

impl QueueEntry {
    /// True when every text field carries content
    pub fn is_complete(&self) -> bool {
        !self.customer.trim().is_empty()
            && !self.motor.trim().is_empty()
            && !self.nopol.trim().is_empty()
    }
}

/// Ordered queue. Insertion order is display order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueueList(Vec<QueueEntry>);

impl QueueList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn entries(&self) -> &[QueueEntry] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, QueueEntry> {
        self.0.iter()
    }

    /// Append at the tail
    pub fn push(&mut self, entry: QueueEntry) {
        self.0.push(entry);
    }

    /// Current display position of an entry
    pub fn position_of(&self, id: &EntryId) -> Option<usize> {
        self.0.iter().position(|e| &e.id == id)
    }

    pub fn get(&self, id: &EntryId) -> Option<&QueueEntry> {
        self.0.iter().find(|e| &e.id == id)
    }

    pub fn get_mut(&mut self, id: &EntryId) -> Option<&mut QueueEntry> {
        self.0.iter_mut().find(|e| &e.id == id)
    }

    /// Id of the entry currently shown at `position`
    pub fn id_at(&self, position: usize) -> Option<&EntryId> {
        self.0.get(position).map(|e| &e.id)
    }

    /// Remove an entry; later entries shift one position earlier
    pub fn remove(&mut self, id: &EntryId) -> Option<QueueEntry> {
        let position = self.position_of(id)?;
        Some(self.0.remove(position))
    }

    pub(crate) fn retain(&mut self, f: impl FnMut(&QueueEntry) -> bool) {
        self.0.retain(f);
    }

    pub(crate) fn iter_mut(&mut self) -> std::slice::IterMut<'_, QueueEntry> {
        self.0.iter_mut()
    }
}

impl From<Vec<QueueEntry>> for QueueList {
    fn from(entries: Vec<QueueEntry>) -> Self {
        Self(entries)
    }
}

impl<'a> IntoIterator for &'a QueueList {
    type Item = &'a QueueEntry;
    type IntoIter = std::slice::Iter<'a, QueueEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, customer: &str) -> QueueEntry {
        NewEntry::new(customer, "Yamaha", "AB 123")
            .unwrap()
            .into_entry(EntryId::new(id))
    }

    #[test]
    fn test_new_entry_trims_fields() {
        let e = NewEntry::new("  Ana ", " Yamaha", "AB 123  ")
            .unwrap()
            .into_entry(EntryId::new("e-1"));
        assert_eq!(e.customer, "Ana");
        assert_eq!(e.motor, "Yamaha");
        assert_eq!(e.nopol, "AB 123");
        assert_eq!(e.status, Status::Queue);
    }

    #[test]
    fn test_new_entry_rejects_blank_fields() {
        let err = NewEntry::new("Ana", "   ", "").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("motor"));
        assert!(msg.contains("nopol"));
        assert!(!msg.contains("customer"));
    }

    #[test]
    fn test_remove_shifts_later_entries() {
        let mut list = QueueList::from(vec![entry("a", "Ana"), entry("b", "Budi"), entry("c", "Citra")]);

        let removed = list.remove(&EntryId::new("b")).unwrap();
        assert_eq!(removed.customer, "Budi");
        assert_eq!(list.len(), 2);
        assert_eq!(list.position_of(&EntryId::new("c")), Some(1));
        assert_eq!(list.id_at(1), Some(&EntryId::new("c")));
        assert!(list.remove(&EntryId::new("b")).is_none());
    }

    #[test]
    fn test_legacy_record_without_id_deserializes() {
        let json = r#"[{"customer":"Ana","motor":"Yamaha","nopol":"AB 123","status":"On Progress"}]"#;
        let list: QueueList = serde_json::from_str(json).unwrap();
        assert_eq!(list.len(), 1);
        assert!(list.entries()[0].id.is_unassigned());
        assert_eq!(list.entries()[0].status, Status::OnProgress);
    }

    #[test]
    fn test_serialized_shape() {
        let list = QueueList::from(vec![entry("a", "Ana")]);
        let value = serde_json::to_value(&list).unwrap();
        assert_eq!(
            value,
            serde_json::json!([{
                "id": "a",
                "customer": "Ana",
                "motor": "Yamaha",
                "nopol": "AB 123",
                "status": "Queue"
            }])
        );
    }
}
