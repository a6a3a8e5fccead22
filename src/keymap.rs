//! Nested binding tables.
//!
//! The double press core only ever talks to tables through [`BindingTables`];
//! [`Keymaps`] is the in-process implementation used by the binary and the
//! tests. A table entry is either a command, a nested prefix table, or a
//! reference to an installed trampoline.

use log::{debug, warn};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

use crate::dispatch::TrampolineId;
use crate::error::DispatchError;
use crate::keys::{CanonicalKey, KeyStroke, RawKey, canonicalize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TableId(usize);

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A named command the host knows how to run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Command(String);

impl Command {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Command {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "target", rename_all = "snake_case")]
pub enum Action {
    Command(Command),
    Unbound,
    /// A prefix table: the key routes into another table.
    Table(TableId),
    /// An installed double press trampoline, referenced by identity.
    Dispatch(TrampolineId),
}

impl Action {
    pub fn is_unbound(&self) -> bool {
        matches!(self, Action::Unbound)
    }

    /// `Unbound` maps to "remove the entry" when writing back to a table.
    pub fn into_binding(self) -> Option<Action> {
        match self {
            Action::Unbound => None,
            other => Some(other),
        }
    }
}

impl From<Command> for Action {
    fn from(command: Command) -> Self {
        Action::Command(command)
    }
}

/// Binding table storage and lookup, as seen by the double press core.
pub trait BindingTables {
    /// The global table. Trampolines installed here never defer their
    /// single press to an ambient lookup.
    fn root(&self) -> TableId;

    /// Look `key` up in `table`, following prefix tables stroke by stroke.
    fn lookup(&self, table: TableId, key: &CanonicalKey) -> Action;

    /// Write `action` at `key`; `None` removes the entry.
    fn bind(&mut self, table: TableId, key: &CanonicalKey, action: Option<Action>);

    /// Look `key` up in every active table, most local first, skipping
    /// `skip`. The first bound result wins.
    fn resolve(&self, key: &CanonicalKey, skip: Option<TableId>) -> Action;
}

pub struct Keymaps {
    tables: Vec<HashMap<KeyStroke, Action>>,
    /// Local tables layered over the root, most recently activated last.
    active: Vec<TableId>,
}

impl Default for Keymaps {
    fn default() -> Self {
        Self::new()
    }
}

impl Keymaps {
    const ROOT: TableId = TableId(0);

    pub fn new() -> Self {
        Self {
            tables: vec![HashMap::new()],
            active: Vec::new(),
        }
    }

    pub fn new_table(&mut self) -> TableId {
        self.tables.push(HashMap::new());
        TableId(self.tables.len() - 1)
    }

    pub fn activate(&mut self, table: TableId) {
        if table != Self::ROOT && !self.active.contains(&table) {
            self.active.push(table);
        }
    }

    pub fn deactivate(&mut self, table: TableId) {
        self.active.retain(|t| *t != table);
    }

    /// Bind a textual or event key to `action` in `table`.
    pub fn define(
        &mut self,
        table: TableId,
        key: impl Into<RawKey>,
        action: impl Into<Action>,
    ) -> Result<(), DispatchError> {
        let key = canonicalize(key)?;
        self.bind(table, &key, action.into().into_binding());
        Ok(())
    }
}

impl BindingTables for Keymaps {
    fn root(&self) -> TableId {
        Self::ROOT
    }

    fn lookup(&self, table: TableId, key: &CanonicalKey) -> Action {
        let strokes = key.strokes();
        let mut current = table;
        for (i, stroke) in strokes.iter().enumerate() {
            let Some(entry) = self.tables.get(current.0).and_then(|t| t.get(stroke)) else {
                return Action::Unbound;
            };
            if i + 1 == strokes.len() {
                return entry.clone();
            }
            match entry {
                Action::Table(next) => current = *next,
                _ => return Action::Unbound,
            }
        }
        Action::Unbound
    }

    fn bind(&mut self, table: TableId, key: &CanonicalKey, action: Option<Action>) {
        let strokes = key.strokes();
        let (last, prefix) = match strokes.split_last() {
            Some(parts) => parts,
            None => return,
        };

        if table.0 >= self.tables.len() {
            warn!("Ignoring write of `{key}` into unknown table {table}");
            return;
        }

        let mut current = table;
        for stroke in prefix {
            let existing = self.tables.get(current.0).and_then(|t| t.get(stroke)).cloned();
            current = match existing {
                Some(Action::Table(next)) => next,
                _ if action.is_none() => return,
                other => {
                    if let Some(replaced) = other {
                        warn!("Replacing {replaced:?} at `{stroke}` with a prefix table");
                    }
                    let next = self.new_table();
                    self.tables[current.0].insert(*stroke, Action::Table(next));
                    next
                }
            };
        }

        let entries = &mut self.tables[current.0];
        match action {
            Some(action) => {
                debug!("Binding `{key}` in {table} to {action:?}");
                entries.insert(*last, action);
            }
            None => {
                debug!("Clearing `{key}` in {table}");
                entries.remove(last);
            }
        }
    }

    fn resolve(&self, key: &CanonicalKey, skip: Option<TableId>) -> Action {
        self.active
            .iter()
            .rev()
            .copied()
            .chain(std::iter::once(Self::ROOT))
            .filter(|table| Some(*table) != skip)
            .map(|table| self.lookup(table, key))
            .find(|action| !action.is_unbound())
            .unwrap_or(Action::Unbound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::parse_key_text;

    fn key(text: &str) -> CanonicalKey {
        parse_key_text(text).unwrap()
    }

    #[test]
    fn test_nested_bind_creates_prefix_tables() {
        let mut keymaps = Keymaps::new();
        let root = keymaps.root();
        keymaps.define(root, "C-x .", Command::new("repeat")).unwrap();

        assert!(matches!(keymaps.lookup(root, &key("C-x")), Action::Table(_)));
        assert_eq!(
            keymaps.lookup(root, &key("C-x .")),
            Action::Command(Command::new("repeat"))
        );
        assert_eq!(keymaps.lookup(root, &key("C-x ,")), Action::Unbound);
        assert_eq!(keymaps.lookup(root, &key("C-x . .")), Action::Unbound);
    }

    #[test]
    fn test_unbind_removes_entry() {
        let mut keymaps = Keymaps::new();
        let root = keymaps.root();
        keymaps.define(root, "a", Command::new("first")).unwrap();
        keymaps.bind(root, &key("a"), None);
        assert_eq!(keymaps.lookup(root, &key("a")), Action::Unbound);

        // Removing below a missing prefix does not create tables.
        keymaps.bind(root, &key("C-c z"), None);
        assert_eq!(keymaps.lookup(root, &key("C-c")), Action::Unbound);
    }

    #[test]
    fn test_resolve_prefers_local_tables() {
        let mut keymaps = Keymaps::new();
        let root = keymaps.root();
        let local = keymaps.new_table();
        keymaps.define(root, "a", Command::new("global-a")).unwrap();
        keymaps.define(local, "a", Command::new("local-a")).unwrap();

        assert_eq!(
            keymaps.resolve(&key("a"), None),
            Action::Command(Command::new("global-a"))
        );

        keymaps.activate(local);
        assert_eq!(
            keymaps.resolve(&key("a"), None),
            Action::Command(Command::new("local-a"))
        );
        assert_eq!(
            keymaps.resolve(&key("a"), Some(local)),
            Action::Command(Command::new("global-a"))
        );

        keymaps.deactivate(local);
        assert_eq!(
            keymaps.resolve(&key("a"), None),
            Action::Command(Command::new("global-a"))
        );
    }

    #[test]
    fn test_action_serializes_with_kind() {
        let action = Action::Command(Command::new("save"));
        assert_eq!(
            serde_json::to_string(&action).unwrap(),
            r#"{"kind":"command","target":"save"}"#
        );
    }
}
