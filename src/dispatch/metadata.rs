use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use crate::keymap::{Action, Command, TableId};
use crate::keys::CanonicalKey;

/// Identity of an installed trampoline, as referenced from binding tables.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TrampolineId(String);

impl TrampolineId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The identity a key gets when the caller does not name it.
    pub fn derived(table: TableId, key: &CanonicalKey) -> Self {
        Self(format!("double-press{table}:{key}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrampolineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a single press falls back to.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SingleAction {
    /// The binding captured when the trampoline was installed.
    Fixed(Action),
    /// Nothing was bound; look the key up again in the ambient tables at
    /// fire time, ignoring `table`.
    DeferredLookup { table: TableId, key: CanonicalKey },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrampolineRecord {
    pub id: TrampolineId,
    pub table: TableId,
    pub key: CanonicalKey,
    pub single_action: Option<SingleAction>,
    pub double_action: Command,
    #[serde(rename = "interval_ms", serialize_with = "serialize_millis")]
    pub interval: Duration,
    pub doc: Option<String>,
}

fn serialize_millis<S: serde::Serializer>(interval: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(u64::try_from(interval.as_millis()).unwrap_or(u64::MAX))
}

/// Records for every live trampoline, indexed by identity and by the
/// (table, key) slot it occupies.
#[derive(Debug, Default)]
pub struct MetadataStore {
    records: HashMap<TrampolineId, TrampolineRecord>,
    slots: HashMap<(TableId, CanonicalKey), TrampolineId>,
}

impl MetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &TrampolineId) -> Option<&TrampolineRecord> {
        self.records.get(id)
    }

    pub fn id_at(&self, table: TableId, key: &CanonicalKey) -> Option<&TrampolineId> {
        self.slots.get(&(table, key.clone()))
    }

    pub(crate) fn insert(&mut self, record: TrampolineRecord) {
        self.slots
            .insert((record.table, record.key.clone()), record.id.clone());
        self.records.insert(record.id.clone(), record);
    }

    pub(crate) fn remove(&mut self, id: &TrampolineId) -> Option<TrampolineRecord> {
        let record = self.records.remove(id)?;
        self.slots.remove(&(record.table, record.key.clone()));
        Some(record)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrampolineRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keymap::{BindingTables, Keymaps};
    use crate::keys::parse_key_text;

    fn record(id: &str, key: &str) -> TrampolineRecord {
        TrampolineRecord {
            id: TrampolineId::new(id),
            table: Keymaps::new().root(),
            key: parse_key_text(key).unwrap(),
            single_action: None,
            double_action: Command::new("double"),
            interval: Duration::from_millis(300),
            doc: Some("Twice is nice".to_string()),
        }
    }

    #[test]
    fn test_insert_and_remove_keep_slots_in_sync() {
        let mut store = MetadataStore::new();
        let rec = record("t1", "<f2>");
        store.insert(rec.clone());

        assert_eq!(store.get(&rec.id), Some(&rec));
        assert_eq!(store.id_at(rec.table, &rec.key), Some(&rec.id));

        assert_eq!(store.remove(&rec.id), Some(rec.clone()));
        assert!(store.is_empty());
        assert_eq!(store.id_at(rec.table, &rec.key), None);
        assert_eq!(store.remove(&rec.id), None);
    }

    #[test]
    fn test_record_serializes_for_introspection() {
        let value = serde_json::to_value(record("t1", "C-x .")).unwrap();
        assert_eq!(value["id"], "t1");
        assert_eq!(value["key"], "C-x .");
        assert_eq!(value["double_action"], "double");
        assert_eq!(value["interval_ms"], 300);
        assert_eq!(value["doc"], "Twice is nice");
    }
}
