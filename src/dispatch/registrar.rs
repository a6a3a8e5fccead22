//! Installing, replacing and removing double press bindings.
//!
//! The registrar is the only code that writes trampolines into binding
//! tables. Every operation validates first and mutates second, so a rejected
//! call leaves both the table and the metadata store untouched.

use anyhow::Result;
use log::{debug, error, info};
use std::time::Duration;

use super::metadata::{MetadataStore, SingleAction, TrampolineId, TrampolineRecord};
use super::trampoline::{DispatchContext, Outcome, Trampoline};
use crate::error::DispatchError;
use crate::keymap::{Action, BindingTables, Command, TableId};
use crate::keys::{CanonicalKey, RawKey, canonicalize};
use crate::settings::Settings;

/// Optional parts of an install.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstallOptions {
    pub id: Option<TrampolineId>,
    pub interval: Option<Duration>,
    pub doc: Option<String>,
}

impl InstallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(TrampolineId::new(id));
        self
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }
}

pub struct Registrar {
    store: MetadataStore,
    default_interval: Duration,
}

impl Default for Registrar {
    fn default() -> Self {
        Self {
            store: MetadataStore::new(),
            default_interval: Duration::from_millis(crate::settings::DEFAULT_INTERVAL_MS),
        }
    }
}

impl Registrar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: &Settings) -> Result<Self, DispatchError> {
        Ok(Self {
            store: MetadataStore::new(),
            default_interval: settings.default_interval()?,
        })
    }

    pub fn default_interval(&self) -> Duration {
        self.default_interval
    }

    /// Affects trampolines installed from now on.
    pub fn set_default_interval(&mut self, interval: Duration) -> Result<(), DispatchError> {
        if interval.is_zero() {
            return Err(DispatchError::InvalidInterval(interval));
        }
        self.default_interval = interval;
        Ok(())
    }

    /// Read-only view used by help and introspection.
    pub fn metadata(&self, id: &TrampolineId) -> Option<&TrampolineRecord> {
        self.store.get(id)
    }

    pub fn records(&self) -> impl Iterator<Item = &TrampolineRecord> {
        self.store.iter()
    }

    pub fn installed_at(
        &self,
        tables: &dyn BindingTables,
        table: TableId,
        key: impl Into<RawKey>,
    ) -> Result<Option<&TrampolineRecord>, DispatchError> {
        let key = canonicalize(key)?;
        Ok(self.live_record(tables, table, &key))
    }

    /// The record at (table, key), provided the table still points at it.
    fn live_record(
        &self,
        tables: &dyn BindingTables,
        table: TableId,
        key: &CanonicalKey,
    ) -> Option<&TrampolineRecord> {
        match tables.lookup(table, key) {
            Action::Dispatch(id) => self
                .store
                .get(&id)
                .filter(|record| record.table == table && &record.key == key),
            _ => None,
        }
    }

    /// Bind `double_action` to `key` in `table`, keeping whatever was bound
    /// there as the single press. Installing over an existing trampoline
    /// replaces it but keeps the original single press. Passing `None` as
    /// the double action uninstalls instead.
    pub fn install(
        &mut self,
        tables: &mut dyn BindingTables,
        table: TableId,
        key: impl Into<RawKey>,
        double_action: Option<Command>,
        options: InstallOptions,
    ) -> Result<Option<TrampolineId>, DispatchError> {
        let key = canonicalize(key)?;
        let Some(double_action) = double_action else {
            self.uninstall_key(tables, table, &key);
            return Ok(None);
        };
        self.install_key(tables, table, key, double_action, options)
            .map(Some)
    }

    fn install_key(
        &mut self,
        tables: &mut dyn BindingTables,
        table: TableId,
        key: CanonicalKey,
        double_action: Command,
        options: InstallOptions,
    ) -> Result<TrampolineId, DispatchError> {
        let interval = options.interval.unwrap_or(self.default_interval);
        if interval.is_zero() {
            return Err(DispatchError::InvalidInterval(interval));
        }

        let id = options
            .id
            .unwrap_or_else(|| TrampolineId::derived(table, &key));
        if let Some(owner) = self.store.get(&id) {
            if owner.table != table || owner.key != key {
                return Err(DispatchError::IdentityInUse {
                    id,
                    key: owner.key.to_string(),
                });
            }
        }

        // Binding `C-x .` turns `C-x` into a prefix table, which would lose a
        // command bound there.
        let mut head = key.prefix();
        while let Some(prefix) = head {
            match tables.lookup(table, &prefix) {
                Action::Table(_) | Action::Unbound => {}
                _ => return Err(DispatchError::PrefixKey(prefix.to_string())),
            }
            head = prefix.prefix();
        }

        let current = match self.live_record(tables, table, &key) {
            Some(record) => record.single_action.clone(),
            None => match tables.lookup(table, &key) {
                Action::Unbound => None,
                action => Some(SingleAction::Fixed(action)),
            },
        };
        if let Some(SingleAction::Fixed(Action::Table(_))) = current {
            return Err(DispatchError::PrefixKey(key.to_string()));
        }

        // Validation done; from here on the install cannot fail.
        self.uninstall_key(tables, table, &key);
        if let Some(stale) = self.store.id_at(table, &key).cloned() {
            debug!("Dropping record {stale} whose binding was overwritten");
            self.store.remove(&stale);
        }

        let single_action = match current {
            Some(single) => Some(single),
            None if table != tables.root() => Some(SingleAction::DeferredLookup {
                table,
                key: key.clone(),
            }),
            None => None,
        };

        info!("Installing {id} on `{key}` in {table}: double {double_action}, {interval:?}");
        debug!("{id}: single press {single_action:?}");
        tables.bind(table, &key, Some(Action::Dispatch(id.clone())));
        self.store.insert(TrampolineRecord {
            id: id.clone(),
            table,
            key,
            single_action,
            double_action,
            interval,
            doc: options.doc,
        });
        Ok(id)
    }

    /// Remove the trampoline at `key`, restoring the binding it replaced.
    /// Returns `false` when no trampoline of ours is bound there.
    pub fn uninstall(
        &mut self,
        tables: &mut dyn BindingTables,
        table: TableId,
        key: impl Into<RawKey>,
    ) -> Result<bool, DispatchError> {
        let key = canonicalize(key)?;
        Ok(self.uninstall_key(tables, table, &key))
    }

    fn uninstall_key(
        &mut self,
        tables: &mut dyn BindingTables,
        table: TableId,
        key: &CanonicalKey,
    ) -> bool {
        let Some(id) = self.live_record(tables, table, key).map(|r| r.id.clone()) else {
            debug!("No double press installed on `{key}` in {table}");
            return false;
        };
        let Some(record) = self.store.remove(&id) else {
            return false;
        };

        let restored = match record.single_action {
            Some(SingleAction::Fixed(action)) => action.into_binding(),
            Some(SingleAction::DeferredLookup { .. }) | None => None,
        };
        info!("Uninstalling {id} from `{key}` in {table}, restoring {restored:?}");
        tables.bind(table, key, restored);
        true
    }

    /// Change what a single press does. With a trampoline installed only the
    /// fallback changes; otherwise this is a plain table write.
    pub fn update_single_action(
        &mut self,
        tables: &mut dyn BindingTables,
        table: TableId,
        key: impl Into<RawKey>,
        single_action: Action,
    ) -> Result<(), DispatchError> {
        let key = canonicalize(key)?;

        let Some(record) = self.live_record(tables, table, &key).cloned() else {
            tables.bind(table, &key, single_action.into_binding());
            return Ok(());
        };
        if let Action::Table(_) = single_action {
            return Err(DispatchError::PrefixKey(key.to_string()));
        }

        self.uninstall_key(tables, table, &key);
        tables.bind(table, &key, single_action.into_binding());
        let options = InstallOptions {
            id: Some(record.id),
            interval: Some(record.interval),
            doc: record.doc,
        };
        self.install_key(tables, table, key, record.double_action, options)?;
        Ok(())
    }

    /// Run the trampoline `id`, reached through `trigger`.
    pub fn dispatch(
        &self,
        id: &TrampolineId,
        trigger: &CanonicalKey,
        ctx: &mut DispatchContext<'_>,
    ) -> Result<Outcome> {
        let Some(record) = self.store.get(id) else {
            error!("Trampoline {id} fired on `{trigger}` after being uninstalled");
            return Err(DispatchError::StaleTrampolineInvocation(id.clone()).into());
        };
        Trampoline::new(record).fire(trigger, self, ctx)
    }
}
