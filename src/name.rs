//! Variable name grammar

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{EnvError, Result};

static NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][0-9A-Za-z_]*$").expect("valid name pattern"));

/// Check that `name` is a legal environment variable name
///
/// Every violation reports the same [`EnvError::NameInvalid`].
pub fn check_name(name: &str) -> Result<()> {
    if NAME_PATTERN.is_match(name) {
        Ok(())
    } else {
        Err(EnvError::NameInvalid(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        for name in ["A", "_", "PORT", "_private", "db_url_2", "camelCase"] {
            assert!(check_name(name).is_ok(), "{}", name);
        }
    }

    #[test]
    fn test_invalid_names() {
        for name in ["", "0BAR", " BAR", "BAR ", "BAR-BAZ", "BAR=1", "BÄR", "A B", "BAR\n"] {
            assert!(
                matches!(check_name(name), Err(EnvError::NameInvalid(_))),
                "{:?}",
                name
            );
        }
    }
}
