//! Project members and the roster that holds them.
//!
//! Members are named participants of a project; they do not need a user
//! account. Two members with the same trimmed name are the same member.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use sharefair_core::{DomainError, DomainResult};

/// Trimmed, non-blank member name. Ordered lexicographically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MemberId(String);

impl MemberId {
    pub fn new(name: impl AsRef<str>) -> DomainResult<Self> {
        let trimmed = name.as_ref().trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation("member name must not be blank"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for MemberId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for MemberId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for MemberId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<MemberId> for String {
    fn from(value: MemberId) -> Self {
        value.0
    }
}

/// Parse a batch of raw names, failing on the first blank one.
pub fn parse_members<I, S>(names: I) -> DomainResult<Vec<MemberId>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names.into_iter().map(MemberId::new).collect()
}

/// Ordered, duplicate-free list of project members.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<MemberId>", into = "Vec<MemberId>")]
pub struct Roster {
    members: Vec<MemberId>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, member: &MemberId) -> bool {
        self.members.contains(member)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MemberId> {
        self.members.iter()
    }

    pub fn as_slice(&self) -> &[MemberId] {
        &self.members
    }

    pub fn add(&mut self, member: MemberId) -> DomainResult<()> {
        if self.contains(&member) {
            return Err(DomainError::validation(format!(
                "member '{member}' already exists"
            )));
        }
        self.members.push(member);
        Ok(())
    }

    /// Add several members; either all are added or none.
    pub fn add_all<I>(&mut self, members: I) -> DomainResult<()>
    where
        I: IntoIterator<Item = MemberId>,
    {
        let mut staged = self.members.clone();
        for member in members {
            if staged.contains(&member) {
                return Err(DomainError::validation(format!(
                    "member '{member}' already exists"
                )));
            }
            staged.push(member);
        }
        self.members = staged;
        Ok(())
    }

    pub fn ensure_contains(&self, member: &MemberId) -> DomainResult<()> {
        if self.contains(member) {
            Ok(())
        } else {
            Err(DomainError::validation(format!(
                "'{member}' is not a member of this project"
            )))
        }
    }
}

impl TryFrom<Vec<MemberId>> for Roster {
    type Error = DomainError;

    fn try_from(value: Vec<MemberId>) -> Result<Self, Self::Error> {
        let mut roster = Roster::new();
        roster.add_all(value)?;
        Ok(roster)
    }
}

impl From<Roster> for Vec<MemberId> {
    fn from(value: Roster) -> Self {
        value.members
    }
}
