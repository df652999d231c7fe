use async_trait::async_trait;
use sea_orm::{DatabaseConnection, EntityTrait};

use super::RepositoryError;
use crate::entity::user;

/// Maps an internal user id to the stable identifier used to namespace that
/// user's stored objects.
#[async_trait]
pub trait UserResolver: Send + Sync {
    async fn resolve_external_id(&self, user_id: i32) -> Result<String, RepositoryError>;
}

pub struct SeaOrmUserResolver {
    db: DatabaseConnection,
}

impl SeaOrmUserResolver {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserResolver for SeaOrmUserResolver {
    async fn resolve_external_id(&self, user_id: i32) -> Result<String, RepositoryError> {
        let user = user::Entity::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("User {user_id}")))?;

        Ok(user.external_id.to_string())
    }
}
