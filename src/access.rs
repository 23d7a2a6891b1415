// Role table, pause flag and the two-step admin handover.
//
// Two roles exist. Admin is a superset: it passes the ScheduleCreator check,
// grants and revokes roles, pauses, withdraws, revokes schedules and mutates
// the claim gate. ScheduleCreator may only install schedules directly.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::{
    crypto::Address,
    error::{VestingError, VestingResult},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    Admin,
    ScheduleCreator,
}

/// A handover in flight: `incumbent` started it, only `nominee` may accept.
/// The nominee is publicly observable between the two steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminHandover {
    pub incumbent: Address,
    pub nominee: Address,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessControl {
    admins: IndexSet<Address>,
    creators: IndexSet<Address>,
    pending_admin: Option<AdminHandover>,
    paused: bool,
}

impl AccessControl {
    pub fn new(admin: Address, vesting_creator: Address) -> Self {
        let mut admins = IndexSet::new();
        admins.insert(admin);
        let mut creators = IndexSet::new();
        creators.insert(vesting_creator);
        Self {
            admins,
            creators,
            pending_admin: None,
            paused: false,
        }
    }

    pub fn has_role(&self, role: Role, who: &Address) -> bool {
        match role {
            Role::Admin => self.admins.contains(who),
            // Admin passes every role check
            Role::ScheduleCreator => self.creators.contains(who) || self.admins.contains(who),
        }
    }

    pub fn require(&self, role: Role, who: &Address) -> VestingResult<()> {
        if self.has_role(role, who) {
            Ok(())
        } else {
            Err(VestingError::Unauthorized)
        }
    }

    /// Grant `role` to `who`. Admin only. Returns whether membership changed.
    pub fn grant_role(&mut self, caller: &Address, role: Role, who: &Address) -> VestingResult<bool> {
        self.require(Role::Admin, caller)?;
        if who.is_zero() {
            return Err(VestingError::InvalidAddress);
        }
        let changed = match role {
            Role::Admin => self.admins.insert(*who),
            Role::ScheduleCreator => self.creators.insert(*who),
        };
        Ok(changed)
    }

    /// Revoke `role` from `who`. Admin only. Returns whether membership changed.
    pub fn revoke_role(
        &mut self,
        caller: &Address,
        role: Role,
        who: &Address,
    ) -> VestingResult<bool> {
        self.require(Role::Admin, caller)?;
        let changed = match role {
            Role::Admin => self.admins.shift_remove(who),
            Role::ScheduleCreator => self.creators.shift_remove(who),
        };
        Ok(changed)
    }

    /// First handover step: record the nominee. Restarting overwrites any
    /// handover already in flight.
    pub fn begin_admin_transfer(
        &mut self,
        caller: &Address,
        nominee: &Address,
    ) -> VestingResult<()> {
        self.require(Role::Admin, caller)?;
        if nominee.is_zero() {
            return Err(VestingError::InvalidAddress);
        }
        self.pending_admin = Some(AdminHandover {
            incumbent: *caller,
            nominee: *nominee,
        });
        Ok(())
    }

    /// Second handover step: the nominee (and only the nominee) atomically
    /// takes over the incumbent's Admin membership. Returns the handover that
    /// completed.
    pub fn accept_admin_transfer(&mut self, caller: &Address) -> VestingResult<AdminHandover> {
        let handover = match self.pending_admin {
            Some(handover) if handover.nominee == *caller => handover,
            _ => return Err(VestingError::AdminTransferFailed),
        };
        self.admins.shift_remove(&handover.incumbent);
        self.admins.insert(handover.nominee);
        self.pending_admin = None;
        Ok(handover)
    }

    /// Abort a handover in flight. Only the incumbent who started it may.
    pub fn cancel_admin_transfer(&mut self, caller: &Address) -> VestingResult<AdminHandover> {
        let handover = self
            .pending_admin
            .ok_or(VestingError::AdminTransferFailed)?;
        if handover.incumbent != *caller {
            return Err(VestingError::Unauthorized);
        }
        self.pending_admin = None;
        Ok(handover)
    }

    pub fn pending_admin(&self) -> Option<&AdminHandover> {
        self.pending_admin.as_ref()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn require_not_paused(&self) -> VestingResult<()> {
        if self.paused {
            Err(VestingError::Paused)
        } else {
            Ok(())
        }
    }

    /// Flip the pause flag. Admin only. Returns whether the flag changed.
    pub fn set_paused(&mut self, caller: &Address, paused: bool) -> VestingResult<bool> {
        self.require(Role::Admin, caller)?;
        let changed = self.paused != paused;
        self.paused = paused;
        Ok(changed)
    }
}
