use serde::{Deserialize, Serialize};

/// Collection holding one profile document per registered user
pub const USERS_COLLECTION: &str = "users";
pub const RESTAURANTS_COLLECTION: &str = "restaurants";
pub const FOODBANKS_COLLECTION: &str = "foodbanks";
pub const DRIVERS_COLLECTION: &str = "drivers";

/// Account role chosen at registration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Restaurant,
    Foodbank,
    Driver,
    /// Any value outside the known set
    Unspecified,
}

impl Role {
    /// Exact, case-sensitive match on the submitted role string
    pub fn parse(role: &str) -> Self {
        match role {
            "restaurant" => Role::Restaurant,
            "foodbank" => Role::Foodbank,
            "driver" => Role::Driver,
            _ => Role::Unspecified,
        }
    }

    /// Collection receiving the role-specific record, if any
    pub fn collection(self) -> Option<&'static str> {
        match self {
            Role::Restaurant => Some(RESTAURANTS_COLLECTION),
            Role::Foodbank => Some(FOODBANKS_COLLECTION),
            Role::Driver => Some(DRIVERS_COLLECTION),
            Role::Unspecified => None,
        }
    }
}

/// Profile document stored under `users/{uid}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub uid: String,
    pub email: String,
    /// Role exactly as submitted, known or not
    pub role: String,
    pub name: String,
    pub address: Option<String>,
}

impl UserProfile {
    pub fn role(&self) -> Role {
        Role::parse(&self.role)
    }
}

/// Driver availability; new drivers start out available
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    Available,
}

/// Role-specific document stored alongside the profile, keyed by the same uid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RoleRecord {
    /// Restaurants and food banks
    Site {
        name: String,
        address: Option<String>,
    },
    Driver {
        name: String,
        availability: Availability,
    },
}

impl RoleRecord {
    /// Record to write for `profile`, paired with its collection.
    /// Unspecified roles get none.
    pub fn for_profile(profile: &UserProfile) -> Option<(&'static str, RoleRecord)> {
        let role = profile.role();
        let collection = role.collection()?;

        let record = match role {
            Role::Restaurant | Role::Foodbank => RoleRecord::Site {
                name: profile.name.clone(),
                address: profile.address.clone(),
            },
            Role::Driver => RoleRecord::Driver {
                name: profile.name.clone(),
                availability: Availability::Available,
            },
            Role::Unspecified => return None,
        };

        Some((collection, record))
    }
}
