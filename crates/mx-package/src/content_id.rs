use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

use crate::errors::PackageError;

/// 128-bit identifier of an installable title
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentId(Uuid);

impl FromStr for ContentId {
    type Err = PackageError;

    /// Accepts the textual GUID forms: hyphenated, simple, braced and urn
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| PackageError::InvalidArgument(s.to_string()))
    }
}

impl fmt::Display for ContentId {
    /// Lowercase hyphenated form, as appended to the service URL
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.hyphenated().fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_canonical_forms() {
        let id: ContentId = "1E2A4F6B-8C0D-4E1F-9A2B-3C4D5E6F7A8B".parse().unwrap();
        assert_eq!(id.to_string(), "1e2a4f6b-8c0d-4e1f-9a2b-3c4d5e6f7a8b");

        let braced: ContentId = "{1e2a4f6b-8c0d-4e1f-9a2b-3c4d5e6f7a8b}".parse().unwrap();
        assert_eq!(braced, id);
    }

    #[test]
    fn test_rejects_store_ids_and_garbage() {
        for input in ["9WZDNCRFJ3TJ", "", "1e2a4f6b-8c0d-4e1f-9a2b", "not-a-guid"] {
            let err = input.parse::<ContentId>().unwrap_err();
            assert!(matches!(err, PackageError::InvalidArgument(_)));
        }
    }
}
