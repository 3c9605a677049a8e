use sea_orm::DatabaseConnection;
use thiserror::Error;

use crate::{entity::prelude::*, error::ViewError, ids::UserId};

#[derive(Debug, Error)]
pub enum UsersServiceError {
    #[error("fatal database error")]
    DbError(#[from] DbErr),

    #[error("user not found")]
    UserNotFound,
}

impl From<UsersServiceError> for ViewError {
    fn from(error: UsersServiceError) -> Self {
        match error {
            UsersServiceError::DbError(error) => ViewError::Db(error),
            UsersServiceError::UserNotFound => ViewError::NotFound,
        }
    }
}

/// Reads over the identity collaborator's user table. `create` exists for
/// that collaborator and for test fixtures; this crate never registers
/// users on its own.
#[derive(Clone)]
pub struct UsersService {
    db: DatabaseConnection,
}

impl UsersService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(&self, username: &str) -> Result<UserModel, UsersServiceError> {
        let user = UserActiveModel {
            id: Set(UserId::new()),
            username: Set(username.to_string()),
        };

        let result = User::insert(user).exec_with_returning(&self.db).await?;

        Ok(result)
    }

    pub async fn get(&self, user_id: UserId) -> Result<UserModel, UsersServiceError> {
        User::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or(UsersServiceError::UserNotFound)
    }

    pub async fn get_by_username(&self, username: &str) -> Result<UserModel, UsersServiceError> {
        User::find()
            .filter(UserColumn::Username.eq(username))
            .one(&self.db)
            .await?
            .ok_or(UsersServiceError::UserNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::migrator::Migrator;
    use sea_orm::Database;
    use sea_orm_migration::MigratorTrait;

    async fn setup_test_service() -> UsersService {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");

        Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");

        UsersService::new(db)
    }

    #[tokio::test]
    async fn test_create_and_get_user() {
        let service = setup_test_service().await;

        let created = service.create("leo").await.expect("Failed to create user");
        let fetched = service.get(created.id).await.unwrap();

        assert_eq!(created.id, fetched.id);
        assert_eq!(fetched.username, "leo");
    }

    #[tokio::test]
    async fn test_get_by_username() {
        let service = setup_test_service().await;

        let created = service.create("mira").await.unwrap();
        let fetched = service.get_by_username("mira").await.unwrap();

        assert_eq!(created.id, fetched.id);
    }

    #[tokio::test]
    async fn test_unknown_username_is_not_found() {
        let service = setup_test_service().await;

        let result = service.get_by_username("nobody").await;
        assert!(matches!(result, Err(UsersServiceError::UserNotFound)));
    }

    #[tokio::test]
    async fn test_duplicate_username_is_rejected() {
        let service = setup_test_service().await;

        service.create("taken").await.unwrap();
        let result = service.create("taken").await;

        assert!(matches!(result, Err(UsersServiceError::DbError(_))));
    }
}
