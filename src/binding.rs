//! Bindings and their conversion/validation strategies

use std::fmt;
use std::sync::Arc;

use crate::error::{BoxError, EnvError, Result};
use crate::value::{Target, Value, ValueKind};

/// Conversion strategy: `(target, name, raw value)`
pub type ParseFn = Arc<dyn Fn(&Target, &str, &str) -> std::result::Result<(), BoxError> + Send + Sync>;

/// Validation strategy run after a successful conversion: `(target, name)`
pub type CheckFn = Arc<dyn Fn(&Target, &str) -> std::result::Result<(), BoxError> + Send + Sync>;

/// Built-in conversion, keyed on the target's kind
pub fn default_parse(target: &Target, _name: &str, raw: &str) -> std::result::Result<(), BoxError> {
    target.parse_default(raw)
}

/// Built-in validation: accept any value
pub fn default_check(_target: &Target, _name: &str) -> std::result::Result<(), BoxError> {
    Ok(())
}

/// A pending registration
///
/// ```
/// use envbind::{EnvRegistry, Registration, Value, Var};
///
/// let port = Var::new(8080u16);
/// let mut registry = EnvRegistry::new();
/// registry
///     .register(
///         Registration::new("PORT", "listen port", &port)
///             .required(true)
///             .check_with(|target, _| match target.current() {
///                 Value::U16(0) => Err("port must be non-zero".into()),
///                 _ => Ok(()),
///             }),
///     )
///     .unwrap();
/// ```
pub struct Registration {
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) target: Target,
    pub(crate) required: bool,
    parse_fn: Option<ParseFn>,
    check_fn: Option<CheckFn>,
}

impl Registration {
    /// Optional registration with the default strategies
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        target: impl Into<Target>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            target: target.into(),
            required: false,
            parse_fn: None,
            check_fn: None,
        }
    }

    /// Fail parsing when the variable is absent or blank
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Replace the default conversion
    pub fn parse_with<F>(mut self, parse_fn: F) -> Self
    where
        F: Fn(&Target, &str, &str) -> std::result::Result<(), BoxError> + Send + Sync + 'static,
    {
        self.parse_fn = Some(Arc::new(parse_fn));
        self
    }

    /// Replace the default (accept-all) validation
    pub fn check_with<F>(mut self, check_fn: F) -> Self
    where
        F: Fn(&Target, &str) -> std::result::Result<(), BoxError> + Send + Sync + 'static,
    {
        self.check_fn = Some(Arc::new(check_fn));
        self
    }

    pub(crate) fn into_binding(self) -> Binding {
        // Snapshot now; later writes to the target do not change it.
        let default_value = self.target.current();
        let parse_fn: ParseFn = match self.parse_fn {
            Some(parse_fn) => parse_fn,
            None => Arc::new(default_parse),
        };
        let check_fn: CheckFn = match self.check_fn {
            Some(check_fn) => check_fn,
            None => Arc::new(default_check),
        };
        Binding {
            name: self.name,
            description: self.description,
            target: self.target,
            default_value,
            required: self.required,
            parse_fn,
            check_fn,
        }
    }
}

/// One registered variable
pub struct Binding {
    name: String,
    description: String,
    target: Target,
    default_value: Value,
    required: bool,
    parse_fn: ParseFn,
    check_fn: CheckFn,
}

impl Binding {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Value of the target at registration time
    pub fn default_value(&self) -> &Value {
        &self.default_value
    }

    pub fn required(&self) -> bool {
        self.required
    }

    pub fn kind(&self) -> ValueKind {
        self.target.kind()
    }

    /// Run conversion then validation against a trimmed, non-empty value
    pub(crate) fn apply(&self, value: &str) -> Result<()> {
        let invalid = |source| EnvError::InvalidEnvironmentVariable {
            name: self.name.clone(),
            value: value.to_string(),
            source,
        };
        (self.parse_fn)(&self.target, &self.name, value).map_err(invalid)?;
        (self.check_fn)(&self.target, &self.name).map_err(invalid)?;
        Ok(())
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("target", &self.target)
            .field("default_value", &self.default_value)
            .field("required", &self.required)
            .finish_non_exhaustive()
    }
}
