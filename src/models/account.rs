use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Identity record kept by the postgres backend
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    /// Issued user identifier
    #[sea_orm(primary_key, auto_increment = false)]
    pub uid: String,

    /// Sign-in email (unique)
    #[sea_orm(unique)]
    pub email: String,

    /// Argon2 hashed password
    #[serde(skip_serializing)]
    pub password_hash: String,

    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_serialization_hides_password_hash() {
        let model = Model {
            uid: "uid-1".to_string(),
            email: "a@b.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            created_at: Utc::now(),
        };

        let json = serde_json::to_string(&model).unwrap();
        assert!(json.contains("a@b.com"));
        assert!(!json.contains("argon2"));
    }
}
