//! Roles, capabilities and the normalized authenticated identity
//!
//! Identities come from two stores (users and monks). Both are folded into
//! one `Identity` before they reach business logic, so handlers only ever
//! ask "may this role do X?" or "does this identity own Y?".

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::data::{Monk, User};
use crate::error::AppError;

/// Role tag carried by every credential
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
    Monk,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
            Self::Monk => "monk",
        }
    }

    /// Parse a stored role string. Unknown values are not a role.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "user" => Some(Self::User),
            "admin" => Some(Self::Admin),
            "monk" => Some(Self::Monk),
            _ => None,
        }
    }

    /// Capability table
    pub fn can(self, capability: Capability) -> bool {
        use Capability::*;

        match self {
            Self::Admin => matches!(
                capability,
                ManageEvents
                    | ModerateStories
                    | DeleteAnyStory
                    | ManageMonks
                    | ManageEducation
                    | ViewDashboard
                    | ComparePreservation
                    | CreateStories
                    | GenerateItineraries
            ),
            Self::Monk => matches!(
                capability,
                ManageOwnPosts
                    | UpdateOwnProfile
                    | AutoApproveStories
                    | CreateStories
                    | GenerateItineraries
            ),
            Self::User => matches!(capability, CreateStories | GenerateItineraries),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Things a role may be allowed to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    ManageEvents,
    ModerateStories,
    DeleteAnyStory,
    ManageMonks,
    ManageEducation,
    ViewDashboard,
    ComparePreservation,
    ManageOwnPosts,
    UpdateOwnProfile,
    /// Stories by this role skip the moderation queue
    AutoApproveStories,
    CreateStories,
    GenerateItineraries,
}

/// Authenticated actor, normalized from either backing store
#[derive(Debug, Clone, Serialize)]
pub struct Identity {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl Identity {
    /// Build from a users row. Rows with an unknown role are treated as
    /// plain users.
    pub fn from_user(user: &User) -> Self {
        let role = match Role::parse(&user.role) {
            Some(Role::Admin) => Role::Admin,
            _ => Role::User,
        };
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            role,
        }
    }

    /// Build from a monks row. Monk records can never carry another role.
    pub fn from_monk(monk: &Monk) -> Self {
        Self {
            id: monk.id.clone(),
            name: monk.name.clone(),
            email: monk.email.clone(),
            role: Role::Monk,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_monk(&self) -> bool {
        self.role == Role::Monk
    }

    pub fn can(&self, capability: Capability) -> bool {
        self.role.can(capability)
    }

    /// Fail with `Forbidden` unless the role holds `capability`
    pub fn require(&self, capability: Capability) -> Result<(), AppError> {
        if self.can(capability) {
            Ok(())
        } else {
            tracing::debug!(
                identity_id = %self.id,
                role = %self.role,
                ?capability,
                "Capability check failed"
            );
            Err(AppError::Forbidden)
        }
    }

    pub fn owns(&self, owner_id: &str) -> bool {
        self.id == owner_id
    }
}
