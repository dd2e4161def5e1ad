//! Business logic helpers for validated group mutations.

use std::collections::HashSet;

use tracing::info;

use splitchain_domain::{Address, Group, Member};

use crate::{address::AddressValidator, time::Clock, CoreError};

const MIN_MEMBERS: usize = 2;
const JOINED_MEMBER_NAME: &str = "New Member";

/// Provides validated construction and membership changes for [`Group`] entities.
pub struct GroupService;

impl GroupService {
    /// Creates a group after validating the name, addresses and member count.
    ///
    /// Blank member names become `Member <n>` where `n` is the 1-based position.
    pub fn create(
        name: &str,
        members: Vec<Member>,
        validator: &dyn AddressValidator,
        clock: &dyn Clock,
    ) -> Result<Group, CoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CoreError::Validation("Group name is required".into()));
        }
        if members.len() < MIN_MEMBERS {
            return Err(CoreError::Validation(format!(
                "A group needs at least {} members",
                MIN_MEMBERS
            )));
        }

        let mut seen: HashSet<Address> = HashSet::new();
        let mut normalized = Vec::with_capacity(members.len());
        for (index, member) in members.into_iter().enumerate() {
            Self::ensure_valid_address(validator, &member.address)?;
            if !seen.insert(member.address.clone()) {
                return Err(CoreError::Validation(format!(
                    "Address {} is already in the group",
                    member.address
                )));
            }
            let name = if member.name.trim().is_empty() {
                format!("Member {}", index + 1)
            } else {
                member.name.trim().to_string()
            };
            normalized.push(Member::new(member.address, name));
        }

        let group = Group::with_created_at(name, normalized, clock.now());
        info!(
            "created group `{}` ({}) with {} members",
            group.name,
            group.id,
            group.members.len()
        );
        Ok(group)
    }

    /// Adds a member through an invite. Returns `false` when already a member.
    pub fn join(
        group: &mut Group,
        member: Member,
        validator: &dyn AddressValidator,
    ) -> Result<bool, CoreError> {
        Self::ensure_valid_address(validator, &member.address)?;
        let name = match member.name.trim() {
            "" => JOINED_MEMBER_NAME.to_string(),
            trimmed => trimmed.to_string(),
        };
        let address = member.address;
        let added = group.add_member(Member::new(address.clone(), name));
        if added {
            info!("{} joined group `{}`", address, group.name);
        }
        Ok(added)
    }

    /// Groups whose name contains `term`, ignoring case. An empty term matches all.
    pub fn search<'a>(groups: &'a [Group], term: &str) -> Vec<&'a Group> {
        let needle = term.trim().to_lowercase();
        groups
            .iter()
            .filter(|group| needle.is_empty() || group.name.to_lowercase().contains(&needle))
            .collect()
    }

    /// Groups in which `address` is a member.
    pub fn groups_for<'a>(groups: &'a [Group], address: &Address) -> Vec<&'a Group> {
        groups.iter().filter(|group| group.is_member(address)).collect()
    }

    fn ensure_valid_address(
        validator: &dyn AddressValidator,
        address: &Address,
    ) -> Result<(), CoreError> {
        if validator.is_valid(address.as_str()) {
            Ok(())
        } else {
            Err(CoreError::Validation(format!(
                "`{}` is not a valid address",
                address
            )))
        }
    }
}
