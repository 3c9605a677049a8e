use sea_orm::DatabaseConnection;
use thiserror::Error;
use tracing::debug;

use crate::{
    cache::FeedCache,
    entity::prelude::*,
    error::ViewError,
    forms::PostForm,
    ids::{PostId, UserId},
    service::feeds::INDEX_VIEW,
};

#[derive(Debug, Error)]
pub enum PostsServiceError {
    #[error("fatal database error")]
    DbError(#[from] DbErr),

    #[error("post not found")]
    PostNotFound,
}

impl From<PostsServiceError> for ViewError {
    fn from(error: PostsServiceError) -> Self {
        match error {
            PostsServiceError::DbError(error) => ViewError::Db(error),
            PostsServiceError::PostNotFound => ViewError::NotFound,
        }
    }
}

#[derive(Clone)]
pub struct PostsService {
    db: DatabaseConnection,
    cache: FeedCache,
}

impl PostsService {
    pub fn new(db: DatabaseConnection, cache: FeedCache) -> Self {
        Self { db, cache }
    }

    /// Persist a validated submission. The author always comes from the
    /// authenticated identity, never from the payload.
    pub async fn create(
        &self,
        author_id: UserId,
        form: &PostForm,
    ) -> Result<PostModel, PostsServiceError> {
        let post = PostActiveModel {
            id: Set(PostId::new()),
            author_id: Set(author_id),
            group_id: Set(form.group),
            text: Set(form.text.clone()),
            image: Set(form.image.clone()),
            pub_date: Set(chrono::Utc::now().to_rfc3339()),
        };

        let result = Post::insert(post).exec_with_returning(&self.db).await?;

        self.cache.invalidate(INDEX_VIEW).await;
        debug!(post = %result.id, "post created");

        Ok(result)
    }

    /// Get a specific post by ID
    pub async fn get(&self, post_id: PostId) -> Result<PostModel, PostsServiceError> {
        Post::find_by_id(post_id)
            .one(&self.db)
            .await?
            .ok_or(PostsServiceError::PostNotFound)
    }

    /// Get a post by its (author username, id) pair, the shape every
    /// post URL uses. A wrong username is the same as a missing post.
    pub async fn get_for_author(
        &self,
        username: &str,
        post_id: PostId,
    ) -> Result<PostModel, PostsServiceError> {
        let post = self.get(post_id).await?;

        let author = User::find_by_id(post.author_id)
            .one(&self.db)
            .await?
            .ok_or(PostsServiceError::PostNotFound)?;

        if author.username != username {
            return Err(PostsServiceError::PostNotFound);
        }

        Ok(post)
    }

    /// Apply an edit in place. The id, author and pub_date never change;
    /// ownership is the caller's to enforce.
    pub async fn update(
        &self,
        post: PostModel,
        form: &PostForm,
    ) -> Result<PostModel, PostsServiceError> {
        let mut post_active: PostActiveModel = post.into();

        post_active.text = Set(form.text.clone());
        post_active.group_id = Set(form.group);
        if let Some(image) = &form.image {
            post_active.image = Set(Some(image.clone()));
        }

        let updated = post_active.update(&self.db).await?;

        self.cache.invalidate(INDEX_VIEW).await;
        debug!(post = %updated.id, "post updated");

        Ok(updated)
    }

    /// Count total posts by an author
    pub async fn count_by_author(&self, author_id: UserId) -> Result<u64, PostsServiceError> {
        let count = Post::find()
            .filter(PostColumn::AuthorId.eq(author_id))
            .count(&self.db)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::migrator::Migrator;
    use sea_orm::Database;
    use sea_orm_migration::MigratorTrait;
    use std::time::Duration;

    async fn setup_test_service() -> PostsService {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");

        Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");

        PostsService::new(db, FeedCache::new(Duration::from_secs(60)))
    }

    async fn create_test_user(service: &PostsService, username: &str) -> UserModel {
        let user = UserActiveModel {
            id: Set(crate::ids::UserId::new()),
            username: Set(username.to_string()),
        };
        User::insert(user)
            .exec_with_returning(&service.db)
            .await
            .unwrap()
    }

    fn form(text: &str) -> PostForm {
        PostForm {
            text: text.to_string(),
            group: None,
            image: None,
        }
    }

    #[tokio::test]
    async fn test_create_post() {
        let service = setup_test_service().await;
        let author = create_test_user(&service, "author").await;

        let post = service
            .create(
                author.id,
                &PostForm {
                    text: "first post".to_string(),
                    group: None,
                    image: Some(vec![0xDE, 0xAD]),
                },
            )
            .await
            .expect("Failed to create post");

        assert_eq!(post.author_id, author.id);
        assert_eq!(post.text, "first post");
        assert_eq!(post.image, Some(vec![0xDE, 0xAD]));
        assert!(post.group_id.is_none());
    }

    #[tokio::test]
    async fn test_get_for_author() {
        let service = setup_test_service().await;
        let author = create_test_user(&service, "author").await;

        let created = service.create(author.id, &form("mine")).await.unwrap();

        let fetched = service.get_for_author("author", created.id).await.unwrap();
        assert_eq!(fetched.id, created.id);
    }

    #[tokio::test]
    async fn test_get_for_wrong_author_is_not_found() {
        let service = setup_test_service().await;
        let author = create_test_user(&service, "author").await;
        create_test_user(&service, "other").await;

        let created = service.create(author.id, &form("mine")).await.unwrap();

        let result = service.get_for_author("other", created.id).await;
        assert!(matches!(result, Err(PostsServiceError::PostNotFound)));
    }

    #[tokio::test]
    async fn test_update_post_keeps_identity_fields() {
        let service = setup_test_service().await;
        let author = create_test_user(&service, "author").await;

        let created = service.create(author.id, &form("original")).await.unwrap();

        let updated = service
            .update(created.clone(), &form("rewritten"))
            .await
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.author_id, created.author_id);
        assert_eq!(updated.pub_date, created.pub_date);
        assert_eq!(updated.text, "rewritten");
    }

    #[tokio::test]
    async fn test_update_without_image_keeps_stored_image() {
        let service = setup_test_service().await;
        let author = create_test_user(&service, "author").await;

        let created = service
            .create(
                author.id,
                &PostForm {
                    text: "with image".to_string(),
                    group: None,
                    image: Some(vec![1, 2, 3]),
                },
            )
            .await
            .unwrap();

        let updated = service.update(created, &form("still has image")).await.unwrap();

        assert_eq!(updated.image, Some(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn test_count_by_author() {
        let service = setup_test_service().await;
        let author = create_test_user(&service, "author").await;
        let other = create_test_user(&service, "other").await;

        for i in 0..3 {
            service
                .create(author.id, &form(&format!("post {}", i)))
                .await
                .unwrap();
        }
        service.create(other.id, &form("not counted")).await.unwrap();

        let count = service.count_by_author(author.id).await.unwrap();
        assert_eq!(count, 3);
    }
}
