//! Groups and their members.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::*;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Member {
    pub address: Address,
    pub name: String,
}

impl Member {
    pub fn new(address: impl Into<Address>, name: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            name: name.into(),
        }
    }
}

impl NamedEntity for Member {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Displayable for Member {
    fn display_label(&self) -> String {
        if self.name.trim().is_empty() {
            self.address.short()
        } else {
            self.name.clone()
        }
    }
}

/// A set of members sharing expenses.
///
/// Members are unique by address. Expenses are referenced by id only; the
/// expense record itself is owned by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: Uuid,
    pub name: String,
    pub members: Vec<Member>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub expenses: Vec<Uuid>,
}

impl Group {
    pub fn new(name: impl Into<String>, members: Vec<Member>) -> Self {
        Self::with_created_at(name, members, Utc::now())
    }

    pub fn with_created_at(
        name: impl Into<String>,
        members: Vec<Member>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            members,
            created_at,
            expenses: Vec::new(),
        }
    }

    pub fn member(&self, address: &Address) -> Option<&Member> {
        self.members.iter().find(|member| &member.address == address)
    }

    pub fn is_member(&self, address: &Address) -> bool {
        self.member(address).is_some()
    }

    /// Adds `member` unless its address is already present. Returns whether it was added.
    pub fn add_member(&mut self, member: Member) -> bool {
        if self.is_member(&member.address) {
            return false;
        }
        self.members.push(member);
        true
    }

    pub fn addresses(&self) -> impl Iterator<Item = &Address> {
        self.members.iter().map(|member| &member.address)
    }

    /// Returns the member's display name, or the shortened address for non-members.
    pub fn display_name(&self, address: &Address) -> String {
        self.member(address)
            .map(Displayable::display_label)
            .unwrap_or_else(|| address.short())
    }

    pub fn record_expense(&mut self, expense_id: Uuid) {
        if !self.expenses.contains(&expense_id) {
            self.expenses.push(expense_id);
        }
    }
}

impl Identifiable for Group {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl NamedEntity for Group {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Displayable for Group {
    fn display_label(&self) -> String {
        format!("{} ({} members)", self.name, self.members.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_member_ignores_duplicate_addresses() {
        let mut group = Group::new(
            "Trip",
            vec![Member::new("0xAA", "Alex"), Member::new("0xbb", "Taylor")],
        );
        assert!(!group.add_member(Member::new("0xaa", "Alex again")));
        assert!(group.add_member(Member::new("0xcc", "Jordan")));
        assert_eq!(group.members.len(), 3);
    }

    #[test]
    fn display_name_falls_back_to_short_address() {
        let group = Group::new("Trip", vec![Member::new("0xaa", "Alex")]);
        let stranger = Address::new("0x15d34AAf54267DB7D7c367839AAf71A00a2C6A65");
        assert_eq!(group.display_name(&Address::new("0xAA")), "Alex");
        assert_eq!(group.display_name(&stranger), "0x15d3...6a65");
    }
}
