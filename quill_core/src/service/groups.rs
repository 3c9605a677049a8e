use sea_orm::DatabaseConnection;
use thiserror::Error;

use crate::{entity::prelude::*, error::ViewError, ids::GroupId};

#[derive(Debug, Error)]
pub enum GroupsServiceError {
    #[error("fatal database error")]
    DbError(#[from] DbErr),

    #[error("group not found")]
    GroupNotFound,
}

impl From<GroupsServiceError> for ViewError {
    fn from(error: GroupsServiceError) -> Self {
        match error {
            GroupsServiceError::DbError(error) => ViewError::Db(error),
            GroupsServiceError::GroupNotFound => ViewError::NotFound,
        }
    }
}

/// Groups are shared, read-only reference data: created out-of-band by an
/// administrator and immutable afterwards.
#[derive(Clone)]
pub struct GroupsService {
    db: DatabaseConnection,
}

impl GroupsService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Administrative bootstrap entry point; there is no in-app surface
    /// for creating groups.
    pub async fn create(
        &self,
        title: &str,
        slug: &str,
        description: &str,
    ) -> Result<GroupModel, GroupsServiceError> {
        let group = GroupActiveModel {
            id: Set(GroupId::new()),
            title: Set(title.to_string()),
            slug: Set(slug.to_string()),
            description: Set(description.to_string()),
        };

        let result = Group::insert(group).exec_with_returning(&self.db).await?;

        Ok(result)
    }

    pub async fn get(&self, group_id: GroupId) -> Result<GroupModel, GroupsServiceError> {
        Group::find_by_id(group_id)
            .one(&self.db)
            .await?
            .ok_or(GroupsServiceError::GroupNotFound)
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<GroupModel, GroupsServiceError> {
        Group::find()
            .filter(GroupColumn::Slug.eq(slug))
            .one(&self.db)
            .await?
            .ok_or(GroupsServiceError::GroupNotFound)
    }

    /// Existence check used when validating a post submission's group choice.
    pub async fn exists(&self, group_id: GroupId) -> Result<bool, GroupsServiceError> {
        let count = Group::find_by_id(group_id).count(&self.db).await?;

        Ok(count > 0)
    }

    /// All groups, for the post form's choice list.
    pub async fn list(&self) -> Result<Vec<GroupModel>, GroupsServiceError> {
        let groups = Group::find()
            .order_by_asc(GroupColumn::Title)
            .all(&self.db)
            .await?;

        Ok(groups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::migrator::Migrator;
    use sea_orm::Database;
    use sea_orm_migration::MigratorTrait;

    async fn setup_test_service() -> GroupsService {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");

        Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");

        GroupsService::new(db)
    }

    #[tokio::test]
    async fn test_create_and_get_by_slug() {
        let service = setup_test_service().await;

        let created = service
            .create("Rustaceans", "rustaceans", "Posts about crabs")
            .await
            .expect("Failed to create group");

        let fetched = service.get_by_slug("rustaceans").await.unwrap();
        assert_eq!(created.id, fetched.id);
        assert_eq!(fetched.title, "Rustaceans");
    }

    #[tokio::test]
    async fn test_unknown_slug_is_not_found() {
        let service = setup_test_service().await;

        let result = service.get_by_slug("missing").await;
        assert!(matches!(result, Err(GroupsServiceError::GroupNotFound)));
    }

    #[tokio::test]
    async fn test_duplicate_slug_is_rejected() {
        let service = setup_test_service().await;

        service.create("One", "taken", "first").await.unwrap();
        let result = service.create("Two", "taken", "second").await;

        assert!(matches!(result, Err(GroupsServiceError::DbError(_))));
    }

    #[tokio::test]
    async fn test_exists() {
        let service = setup_test_service().await;

        let group = service.create("One", "one", "a group").await.unwrap();

        assert!(service.exists(group.id).await.unwrap());
        assert!(!service.exists(crate::ids::GroupId::new()).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_orders_by_title() {
        let service = setup_test_service().await;

        service.create("Zebras", "zebras", "z").await.unwrap();
        service.create("Antelopes", "antelopes", "a").await.unwrap();

        let groups = service.list().await.unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].title, "Antelopes");
    }
}
