//! Environment Registry
//!
//! Binds environment variable names to caller-owned typed storage, then
//! fills that storage from an environment in one parse pass.

use std::any::Any;
use std::collections::HashMap;
use std::env::VarError;

use serde::Serialize;
use tracing::{debug, trace};

use crate::binding::{Binding, Registration};
use crate::error::{EnvError, Result};
use crate::name::check_name;
use crate::source::{EnvSource, ProcessEnv};
use crate::value::{Target, Value, ValueKind};

/// Usage metadata for one binding
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageEntry<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub kind: ValueKind,
    pub default: &'a Value,
    pub required: bool,
}

/// The environment registry
///
/// One binding per name, and one binding per storage location. Owned by the
/// application; build one during startup, call [`EnvRegistry::parse`], then
/// read the bound [`Var`](crate::Var)s.
#[derive(Debug, Default)]
pub struct EnvRegistry {
    /// name -> binding
    bindings: HashMap<String, Binding>,
}

impl EnvRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a variable
    ///
    /// Fails with [`EnvError::NameInvalid`] for an illegal name,
    /// [`EnvError::NameAlreadyRegistered`] if the name is taken and
    /// [`EnvError::TargetAlreadyBound`] if the storage location is already
    /// bound under another name. Nothing is read from the environment.
    pub fn register(&mut self, registration: Registration) -> Result<()> {
        check_name(&registration.name)?;

        if self.bindings.contains_key(&registration.name) {
            return Err(EnvError::NameAlreadyRegistered(registration.name));
        }

        if let Some(existing) = self
            .bindings
            .values()
            .find(|b| b.target().same_location(&registration.target))
        {
            return Err(EnvError::TargetAlreadyBound {
                existing: existing.name().to_string(),
            });
        }

        let binding = registration.into_binding();
        debug!(
            var = binding.name(),
            kind = %binding.kind(),
            default = %binding.default_value(),
            required = binding.required(),
            "registered environment variable"
        );
        self.bindings.insert(binding.name().to_string(), binding);

        Ok(())
    }

    /// Register a type-erased target with the default strategies
    ///
    /// `target` must be a [`Var`](crate::Var) of a supported primitive or a
    /// [`Target`]; anything else fails with [`EnvError::ValueInvalid`].
    pub fn register_dyn(
        &mut self,
        name: &str,
        description: &str,
        target: &dyn Any,
        required: bool,
    ) -> Result<()> {
        check_name(name)?;
        let target = Target::from_any(target)?;
        self.register(Registration::new(name, description, target).required(required))
    }

    /// Get a binding by name
    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.bindings.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// All registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.bindings.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Drop every binding
    pub fn clear(&mut self) {
        self.bindings.clear();
    }

    /// Visit every binding in ascending name order
    pub fn usage<'a, F>(&'a self, mut visit: F)
    where
        F: FnMut(&UsageEntry<'a>),
    {
        for binding in self.sorted() {
            visit(&UsageEntry {
                name: binding.name(),
                description: binding.description(),
                kind: binding.kind(),
                default: binding.default_value(),
                required: binding.required(),
            });
        }
    }

    /// Usage metadata for every binding, in ascending name order
    pub fn usage_entries(&self) -> Vec<UsageEntry<'_>> {
        let mut entries = Vec::with_capacity(self.bindings.len());
        self.usage(|entry| entries.push(entry.clone()));
        entries
    }

    /// Fill every bound target from the process environment
    pub fn parse(&self) -> Result<()> {
        self.parse_from(ProcessEnv)
    }

    /// Fill every bound target from `source`
    ///
    /// Values are trimmed; a blank or unset variable leaves its target alone,
    /// unless the binding is required. A set but non-unicode variable is an
    /// [`EnvError::InvalidEnvironmentVariable`]. Stops at the first failure.
    /// Targets written before the failure keep their new values.
    pub fn parse_from<S: EnvSource>(&self, source: S) -> Result<()> {
        for binding in self.sorted() {
            let name = binding.name();
            let raw = match source.var(name) {
                Ok(raw) => raw,
                Err(VarError::NotPresent) => String::new(),
                Err(VarError::NotUnicode(os)) => {
                    return Err(EnvError::InvalidEnvironmentVariable {
                        name: name.to_string(),
                        value: os.to_string_lossy().into_owned(),
                        source: "value is not valid unicode".into(),
                    });
                }
            };
            let value = raw.trim();

            if value.is_empty() {
                if binding.required() {
                    return Err(EnvError::RequiredMissing(name.to_string()));
                }
                trace!(var = name, "environment variable not set, keeping default");
                continue;
            }

            binding.apply(value)?;
            debug!(var = name, value, "applied environment variable");
        }

        Ok(())
    }

    fn sorted(&self) -> Vec<&Binding> {
        let mut bindings: Vec<_> = self.bindings.values().collect();
        bindings.sort_unstable_by(|a, b| a.name().cmp(b.name()));
        bindings
    }
}
