//! # Access Control
//!
//! Tracks who is logged in to the admin area and with which [Tier].
//!
//! Two kinds of identity can log in: the single master identity, whose
//! credential comes from configuration and bypasses the admin directory, and
//! the collaborators listed in the directory. Each gated operation requires a
//! single [Privilege]; [Privilege::qualifying_tiers] decides which tiers hold
//! it.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::{CasetaError, CasetaResult};
use crate::models::admin::Admin;

/// The master identity's credential pair.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct MasterCredential {
    pub member_id: String,
    pub password: String,
}

impl MasterCredential {
    pub fn new(member_id: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            member_id: member_id.into(),
            password: password.into(),
        }
    }

    fn matches(&self, member_id: &str, password: &str) -> bool {
        self.member_id == member_id && self.password == password
    }
}

impl fmt::Debug for MasterCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MasterCredential")
            .field("member_id", &self.member_id)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Master,
    Collaborator,
}

impl Tier {
    pub fn name(&self) -> &str {
        match self {
            Tier::Master => "master",
            Tier::Collaborator => "collaborator",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Privilege {
    /// Confirm payment of or cancel any reservation.
    ModerateReservations,
    /// List the admin directory.
    ViewAdmins,
    /// Add, re-password or remove directory admins.
    ManageAdmins,
}

impl Privilege {
    /// Tiers that hold this privilege. Each listed tier is individually
    /// sufficient.
    pub fn qualifying_tiers(&self) -> &'static [Tier] {
        match self {
            Privilege::ModerateReservations => &[Tier::Master, Tier::Collaborator],
            Privilege::ViewAdmins => &[Tier::Master, Tier::Collaborator],
            Privilege::ManageAdmins => &[Tier::Master],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    LoggedOut,
    LoggedIn { identity: String, tier: Tier },
}

#[derive(Debug, Clone)]
pub struct AccessControl {
    master: MasterCredential,
    state: SessionState,
}

impl AccessControl {
    pub fn new(master: MasterCredential) -> Self {
        Self {
            master,
            state: SessionState::LoggedOut,
        }
    }

    /// Checks `member_id`/`password` against the master credential first,
    /// then against the given directory snapshot.
    ///
    /// A failed attempt leaves the current state untouched and yields
    /// [CasetaError::AuthFailure].
    pub fn login(&mut self, member_id: &str, password: &str, directory: &[Admin]) -> CasetaResult<Tier> {
        let tier = if self.master.matches(member_id, password) {
            Tier::Master
        } else if directory.iter().any(|admin| admin.matches(member_id, password)) {
            Tier::Collaborator
        } else {
            warn!("Rejected login attempt for member {}", member_id);
            return Err(CasetaError::AuthFailure(format!(
                "Invalid credentials for member {}",
                member_id
            )));
        };

        info!("Member {} logged in as {}", member_id, tier.name());
        self.state = SessionState::LoggedIn {
            identity: member_id.to_string(),
            tier,
        };
        Ok(tier)
    }

    pub fn logout(&mut self) {
        if let SessionState::LoggedIn { identity, .. } = &self.state {
            info!("Member {} logged out", identity);
        }
        self.state = SessionState::LoggedOut;
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn identity(&self) -> Option<&str> {
        match &self.state {
            SessionState::LoggedIn { identity, .. } => Some(identity),
            SessionState::LoggedOut => None,
        }
    }

    pub fn tier(&self) -> Option<Tier> {
        match &self.state {
            SessionState::LoggedIn { tier, .. } => Some(*tier),
            SessionState::LoggedOut => None,
        }
    }

    pub fn has_privilege(&self, privilege: Privilege) -> bool {
        self.tier()
            .is_some_and(|tier| privilege.qualifying_tiers().contains(&tier))
    }

    /// Like [Self::has_privilege], but yields an [CasetaError::Authorization]
    /// error naming the missing privilege.
    pub fn check_privilege(&self, privilege: Privilege) -> CasetaResult<()> {
        if self.has_privilege(privilege) {
            Ok(())
        } else {
            Err(CasetaError::Authorization(format!(
                "{:?} requires one of {:?}",
                privilege,
                privilege.qualifying_tiers()
            )))
        }
    }
}
