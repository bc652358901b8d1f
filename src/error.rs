//! Error types for the environment registry

use thiserror::Error;

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, EnvError>;

/// Error returned by parse and check strategies
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Environment registry errors
#[derive(Error, Debug)]
pub enum EnvError {
    #[error("invalid name {0:?}: must be non-empty, start with [A-Za-z_] and contain only [0-9A-Za-z_]")]
    NameInvalid(String),

    #[error("value must be a Var of one of: String, bool, isize, usize, 8-64 bit int or uint, 32-64 bit float")]
    ValueInvalid,

    #[error("target already bound to {existing:?}")]
    TargetAlreadyBound { existing: String },

    #[error("name already registered: {0:?}")]
    NameAlreadyRegistered(String),

    #[error("required environment variable {0:?} is not defined")]
    RequiredMissing(String),

    #[error("invalid environment variable {name:?} = {value:?}: {source}")]
    InvalidEnvironmentVariable {
        name: String,
        value: String,
        #[source]
        source: BoxError,
    },

    #[error("invalid default for {name:?} = {value:?}: {source}")]
    InvalidDefault {
        name: String,
        value: String,
        #[source]
        source: BoxError,
    },
}

impl EnvError {
    /// True for either duplicate-registration kind
    pub fn is_duplicate(&self) -> bool {
        matches!(
            self,
            EnvError::TargetAlreadyBound { .. } | EnvError::NameAlreadyRegistered(_)
        )
    }

    /// Name of the variable this error is about, if any
    pub fn variable(&self) -> Option<&str> {
        match self {
            EnvError::NameInvalid(name)
            | EnvError::NameAlreadyRegistered(name)
            | EnvError::RequiredMissing(name) => Some(name.as_str()),
            EnvError::InvalidEnvironmentVariable { name, .. }
            | EnvError::InvalidDefault { name, .. } => Some(name.as_str()),
            EnvError::ValueInvalid | EnvError::TargetAlreadyBound { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_variable_message() {
        let err = EnvError::InvalidEnvironmentVariable {
            name: "PORT".to_string(),
            value: "notanumber".to_string(),
            source: "invalid digit found in string".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("\"PORT\""));
        assert!(msg.contains("\"notanumber\""));
        assert!(msg.contains("invalid digit"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_duplicate_kinds() {
        assert!(EnvError::NameAlreadyRegistered("A".into()).is_duplicate());
        assert!(EnvError::TargetAlreadyBound { existing: "A".into() }.is_duplicate());
        assert!(!EnvError::ValueInvalid.is_duplicate());
        assert_eq!(EnvError::RequiredMissing("FLAG".into()).variable(), Some("FLAG"));
    }
}
