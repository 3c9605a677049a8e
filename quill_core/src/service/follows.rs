use sea_orm::{sea_query::OnConflict, DatabaseConnection};
use thiserror::Error;

use crate::{
    entity::prelude::*,
    error::ViewError,
    ids::{FollowId, UserId},
};

#[derive(Debug, Error)]
pub enum FollowsServiceError {
    #[error("fatal database error")]
    DbError(#[from] DbErr),
}

impl From<FollowsServiceError> for ViewError {
    fn from(error: FollowsServiceError) -> Self {
        match error {
            FollowsServiceError::DbError(error) => ViewError::Db(error),
        }
    }
}

#[derive(Clone)]
pub struct FollowsService {
    db: DatabaseConnection,
}

impl FollowsService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Idempotent subscribe; returns true if a new edge was inserted.
    ///
    /// The UNIQUE(follower_id, author_id) index resolves concurrent
    /// duplicates, so losing the race reads as an ordinary no-op.
    pub async fn follow(
        &self,
        follower_id: UserId,
        author_id: UserId,
    ) -> Result<bool, FollowsServiceError> {
        let follow = FollowActiveModel {
            id: Set(FollowId::new()),
            follower_id: Set(follower_id),
            author_id: Set(author_id),
        };

        let result = Follow::insert(follow)
            .on_conflict(
                OnConflict::columns([FollowColumn::FollowerId, FollowColumn::AuthorId])
                    .do_nothing()
                    .to_owned(),
            )
            .do_nothing()
            .exec(&self.db)
            .await?;

        Ok(matches!(result, TryInsertResult::Inserted(_)))
    }

    /// Idempotent unsubscribe; returns true if an edge was removed.
    pub async fn unfollow(
        &self,
        follower_id: UserId,
        author_id: UserId,
    ) -> Result<bool, FollowsServiceError> {
        let result = Follow::delete_many()
            .filter(FollowColumn::FollowerId.eq(follower_id))
            .filter(FollowColumn::AuthorId.eq(author_id))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected > 0)
    }

    /// Explicit boolean existence check for a (follower, author) pair.
    pub async fn is_following(
        &self,
        follower_id: UserId,
        author_id: UserId,
    ) -> Result<bool, FollowsServiceError> {
        let count = Follow::find()
            .filter(FollowColumn::FollowerId.eq(follower_id))
            .filter(FollowColumn::AuthorId.eq(author_id))
            .count(&self.db)
            .await?;

        Ok(count > 0)
    }

    /// Authors the user subscribes to, for the subscription feed.
    pub async fn following_ids(&self, follower_id: UserId) -> Result<Vec<UserId>, FollowsServiceError> {
        let follows = Follow::find()
            .filter(FollowColumn::FollowerId.eq(follower_id))
            .all(&self.db)
            .await?;

        Ok(follows.into_iter().map(|f| f.author_id).collect())
    }

    /// Count users subscribed to this author
    pub async fn follower_count(&self, author_id: UserId) -> Result<u64, FollowsServiceError> {
        let count = Follow::find()
            .filter(FollowColumn::AuthorId.eq(author_id))
            .count(&self.db)
            .await?;

        Ok(count)
    }

    /// Count authors this user subscribes to
    pub async fn following_count(&self, follower_id: UserId) -> Result<u64, FollowsServiceError> {
        let count = Follow::find()
            .filter(FollowColumn::FollowerId.eq(follower_id))
            .count(&self.db)
            .await?;

        Ok(count)
    }
}
