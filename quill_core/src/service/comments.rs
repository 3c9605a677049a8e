use sea_orm::DatabaseConnection;
use thiserror::Error;

use crate::{
    entity::prelude::*,
    error::ViewError,
    forms::CommentForm,
    ids::{CommentId, PostId, UserId},
};

#[derive(Debug, Error)]
pub enum CommentsServiceError {
    #[error("fatal database error")]
    DbError(#[from] DbErr),

    #[error("post not found")]
    PostNotFound,
}

impl From<CommentsServiceError> for ViewError {
    fn from(error: CommentsServiceError) -> Self {
        match error {
            CommentsServiceError::DbError(error) => ViewError::Db(error),
            CommentsServiceError::PostNotFound => ViewError::NotFound,
        }
    }
}

#[derive(Clone)]
pub struct CommentsService {
    db: DatabaseConnection,
}

impl CommentsService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Attach a validated comment to a post. Comments are immutable after
    /// this point.
    pub async fn create(
        &self,
        post_id: PostId,
        author_id: UserId,
        form: &CommentForm,
    ) -> Result<CommentModel, CommentsServiceError> {
        // Verify post exists
        let post_exists = Post::find_by_id(post_id).one(&self.db).await?.is_some();

        if !post_exists {
            return Err(CommentsServiceError::PostNotFound);
        }

        let comment = CommentActiveModel {
            id: Set(CommentId::new()),
            post_id: Set(post_id),
            author_id: Set(author_id),
            text: Set(form.text.clone()),
            created: Set(chrono::Utc::now().to_rfc3339()),
        };

        let result = Comment::insert(comment).exec_with_returning(&self.db).await?;

        Ok(result)
    }

    /// List a post's comments in conversation order
    pub async fn list_for_post(
        &self,
        post_id: PostId,
    ) -> Result<Vec<CommentModel>, CommentsServiceError> {
        let comments = Comment::find()
            .filter(CommentColumn::PostId.eq(post_id))
            .order_by_asc(CommentColumn::Created)
            .all(&self.db)
            .await?;

        Ok(comments)
    }

    /// Count comments on a post
    pub async fn count_for_post(&self, post_id: PostId) -> Result<u64, CommentsServiceError> {
        let count = Comment::find()
            .filter(CommentColumn::PostId.eq(post_id))
            .count(&self.db)
            .await?;

        Ok(count)
    }
}
