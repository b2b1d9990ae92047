//! Activation status shared by users, merchants and products.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Whether a participant may take part in mutating operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceStatus {
    #[default]
    Active,
    Inactive,
}

impl ResourceStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, ResourceStatus::Active)
    }

    /// Fails with [`DomainError::ResourceInactive`] unless active.
    pub fn ensure_active(
        &self,
        resource: &'static str,
        id: impl std::fmt::Display,
    ) -> Result<(), DomainError> {
        if self.is_active() {
            Ok(())
        } else {
            Err(DomainError::ResourceInactive {
                resource,
                id: id.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_ensure_active() {
        assert!(ResourceStatus::Active.ensure_active("User", 1).is_ok());

        let err = ResourceStatus::Inactive
            .ensure_active("User", "u-7")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ResourceInactive);
        assert_eq!(err.to_string(), "User u-7 is inactive");
    }
}
