use anyhow::{Result, anyhow};
use log::debug;
use std::collections::HashMap;

use crate::keymap::Command;
use crate::keys::CanonicalKey;

/// Trait for running commands (mockable for testing)
pub trait CommandInvoker {
    /// Run `command` as if the user had typed `keys` to reach it.
    fn invoke(&mut self, command: &Command, keys: &CanonicalKey) -> Result<()>;
}

type Handler = Box<dyn FnMut(&CanonicalKey) -> Result<()>>;

/// Commands registered by name.
#[derive(Default)]
pub struct CommandRegistry {
    handlers: HashMap<String, Handler>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, name: impl Into<String>, handler: F)
    where
        F: FnMut(&CanonicalKey) -> Result<()> + 'static,
    {
        self.handlers.insert(name.into(), Box::new(handler));
    }
}

impl CommandInvoker for CommandRegistry {
    fn invoke(&mut self, command: &Command, keys: &CanonicalKey) -> Result<()> {
        let handler = self
            .handlers
            .get_mut(command.name())
            .ok_or_else(|| anyhow!("`{command}` is not a registered command"))?;
        debug!("Running `{command}` for `{keys}`");
        handler(keys)
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[derive(Default)]
pub struct RecordingInvoker {
    pub invoked: Vec<String>,
    pub fail_on: Option<String>,
}

#[cfg(any(test, feature = "test-utils"))]
impl RecordingInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing_on(command: &str) -> Self {
        Self {
            invoked: Vec::new(),
            fail_on: Some(command.to_string()),
        }
    }

    /// Invocations as `command@keys`
    pub fn get_invoked(&self) -> Vec<String> {
        self.invoked.clone()
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl CommandInvoker for RecordingInvoker {
    fn invoke(&mut self, command: &Command, keys: &CanonicalKey) -> Result<()> {
        self.invoked.push(format!("{command}@{keys}"));
        if self.fail_on.as_deref() == Some(command.name()) {
            Err(anyhow!("Mock failure in `{command}`"))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::parse_key_text;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_registry_runs_named_handler() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut registry = CommandRegistry::new();
        let sink = Rc::clone(&seen);
        registry.register("mark", move |keys| {
            sink.borrow_mut().push(keys.to_string());
            Ok(())
        });

        let keys = parse_key_text("C-x .").unwrap();
        registry.invoke(&Command::new("mark"), &keys).unwrap();

        assert_eq!(*seen.borrow(), vec!["C-x .".to_string()]);
    }

    #[test]
    fn test_unknown_command_fails() {
        let mut registry = CommandRegistry::new();
        let keys = parse_key_text("a").unwrap();
        let err = registry.invoke(&Command::new("missing"), &keys).unwrap_err();
        assert!(err.to_string().contains("missing"));
    }
}
