//! Change-status lifecycle for differential persistence.
//!
//! Every tracked entity carries a [`ChangeStatus`]. Gateways read it to decide
//! what to write (insert / update / delete / nothing) and reset it once the
//! write succeeded. Transitions go through [`ChangeStatus::transition`] so an
//! illegal move (e.g. editing a deleted record) is an error, not a silent
//! overwrite of a flag.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Lifecycle tag of a tracked entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeStatus {
    /// Constructed in memory, never stored.
    #[default]
    New,
    /// Identical to what the gateway last stored.
    Unchanged,
    /// Stored before, mutated since.
    Modified,
    /// Removed. Terminal.
    Deleted,
}

/// Something that happened to a tracked entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeEvent {
    /// A field was changed.
    Mutated,
    /// A gateway stored the entity.
    Persisted,
    /// The entity was explicitly removed.
    Removed,
}

impl ChangeStatus {
    /// Apply `event` and return the next status.
    pub fn transition(self, event: ChangeEvent) -> DomainResult<ChangeStatus> {
        use ChangeEvent::*;
        use ChangeStatus::*;

        match (self, event) {
            // Still an insert from the gateway's point of view.
            (New, Mutated) => Ok(New),
            (Unchanged | Modified, Mutated) => Ok(Modified),
            (New | Unchanged | Modified, Persisted) => Ok(Unchanged),
            (_, Removed) => Ok(Deleted),
            (Deleted, Mutated) => Err(DomainError::invalid_state(
                "cannot modify an entity that has been deleted",
            )),
            (Deleted, Persisted) => Err(DomainError::invalid_state(
                "a deleted entity cannot be persisted as live",
            )),
        }
    }

    pub fn is_deleted(self) -> bool {
        matches!(self, ChangeStatus::Deleted)
    }

    /// Whether a gateway has anything to write for this status.
    pub fn is_dirty(self) -> bool {
        !matches!(self, ChangeStatus::Unchanged)
    }

    pub fn code(self) -> &'static str {
        match self {
            ChangeStatus::New => "NEW",
            ChangeStatus::Unchanged => "UNCHANGED",
            ChangeStatus::Modified => "MODIFIED",
            ChangeStatus::Deleted => "DELETED",
        }
    }
}

impl core::fmt::Display for ChangeStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for ChangeStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NEW" => Ok(ChangeStatus::New),
            "UNCHANGED" => Ok(ChangeStatus::Unchanged),
            // Legacy rows store the modified state as UPDATED.
            "MODIFIED" | "UPDATED" => Ok(ChangeStatus::Modified),
            "DELETED" => Ok(ChangeStatus::Deleted),
            other => Err(DomainError::validation(format!(
                "unknown change status code '{other}' (expected NEW, UNCHANGED, MODIFIED or DELETED)"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_status_is_new() {
        assert_eq!(ChangeStatus::default(), ChangeStatus::New);
    }

    #[test]
    fn persisting_new_or_modified_yields_unchanged() {
        for status in [ChangeStatus::New, ChangeStatus::Modified, ChangeStatus::Unchanged] {
            assert_eq!(
                status.transition(ChangeEvent::Persisted).unwrap(),
                ChangeStatus::Unchanged
            );
        }
    }

    #[test]
    fn mutating_a_stored_entity_marks_it_modified() {
        assert_eq!(
            ChangeStatus::Unchanged.transition(ChangeEvent::Mutated).unwrap(),
            ChangeStatus::Modified
        );
        assert_eq!(
            ChangeStatus::Modified.transition(ChangeEvent::Mutated).unwrap(),
            ChangeStatus::Modified
        );
    }

    #[test]
    fn mutating_an_unsaved_entity_keeps_it_new() {
        assert_eq!(
            ChangeStatus::New.transition(ChangeEvent::Mutated).unwrap(),
            ChangeStatus::New
        );
    }

    #[test]
    fn deleted_is_terminal() {
        let deleted = ChangeStatus::Unchanged.transition(ChangeEvent::Removed).unwrap();
        assert_eq!(deleted, ChangeStatus::Deleted);
        assert!(matches!(
            deleted.transition(ChangeEvent::Mutated),
            Err(DomainError::InvalidState(_))
        ));
        assert!(matches!(
            deleted.transition(ChangeEvent::Persisted),
            Err(DomainError::InvalidState(_))
        ));
        assert_eq!(
            deleted.transition(ChangeEvent::Removed).unwrap(),
            ChangeStatus::Deleted
        );
    }

    #[test]
    fn codes_parse_back() {
        for status in [
            ChangeStatus::New,
            ChangeStatus::Unchanged,
            ChangeStatus::Modified,
            ChangeStatus::Deleted,
        ] {
            assert_eq!(status.code().parse::<ChangeStatus>().unwrap(), status);
        }
        assert_eq!("updated".parse::<ChangeStatus>().unwrap(), ChangeStatus::Modified);
    }

    #[test]
    fn unknown_code_is_rejected_with_the_code_in_the_message() {
        match "ARCHIVED".parse::<ChangeStatus>() {
            Err(DomainError::Validation(msg)) => assert!(msg.contains("ARCHIVED")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
