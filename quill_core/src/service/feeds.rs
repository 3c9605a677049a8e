use sea_orm::{DatabaseConnection, Select};
use serde::Serialize;
use thiserror::Error;

use crate::{
    cache::FeedCache,
    entity::prelude::*,
    error::ViewError,
    ids::{GroupId, UserId},
};

/// Cache key for the global feed, the only cached view.
pub const INDEX_VIEW: &str = "index";

#[derive(Debug, Error)]
pub enum FeedsServiceError {
    #[error("fatal database error")]
    DbError(#[from] DbErr),
}

impl From<FeedsServiceError> for ViewError {
    fn from(error: FeedsServiceError) -> Self {
        match error {
            FeedsServiceError::DbError(error) => ViewError::Db(error),
        }
    }
}

/// One slice of an ordered post sequence.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Page<T> {
    /// 1-based page number this slice was built for.
    pub number: u64,
    pub items: Vec<T>,
    pub total_items: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.number < self.total_pages
    }

    pub fn has_prev(&self) -> bool {
        self.number > 1
    }

    fn empty(number: u64) -> Self {
        Self {
            number,
            items: vec![],
            total_items: 0,
            total_pages: 0,
        }
    }
}

/// Parse a raw `page` query parameter. Absent, malformed or zero input
/// all land on the first page.
pub fn page_number(raw: Option<&str>) -> u64 {
    raw.and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|&n| n >= 1)
        .unwrap_or(1)
}

/// Aggregates shown next to an author's posts on the profile and post pages.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AuthorStats {
    pub posts_amount: u64,
    pub followers: u64,
    pub following: u64,
    /// Whether the current viewer subscribes to this author; always false
    /// for anonymous viewers.
    pub is_followed: bool,
}

/// Profile feed: the author's page of posts plus their stat block.
#[derive(Clone, Debug)]
pub struct ProfileFeed {
    pub page: Page<PostModel>,
    pub stats: AuthorStats,
}

#[derive(Clone)]
pub struct FeedsService {
    db: DatabaseConnection,
    cache: FeedCache,
    page_size: u64,
}

impl FeedsService {
    pub fn new(db: DatabaseConnection, cache: FeedCache, page_size: u64) -> Self {
        Self {
            db,
            cache,
            page_size: page_size.max(1),
        }
    }

    async fn paginate(
        &self,
        select: Select<Post>,
        number: u64,
    ) -> Result<Page<PostModel>, FeedsServiceError> {
        let number = number.max(1);
        let paginator = select.paginate(&self.db, self.page_size);

        let ItemsAndPagesNumber {
            number_of_items,
            number_of_pages,
        } = paginator.num_items_and_pages().await?;

        // Past-the-end pages come back empty rather than failing
        let items = paginator.fetch_page(number - 1).await?;

        Ok(Page {
            number,
            items,
            total_items: number_of_items,
            total_pages: number_of_pages,
        })
    }

    /// Global feed: all posts, most recent first. Read-through cached.
    pub async fn index(&self, number: u64) -> Result<Page<PostModel>, FeedsServiceError> {
        let number = number.max(1);

        if let Some(page) = self.cache.get(INDEX_VIEW, number).await {
            return Ok(page);
        }

        let page = self
            .paginate(Post::find().order_by_desc(PostColumn::PubDate), number)
            .await?;

        self.cache.put(INDEX_VIEW, number, page.clone()).await;

        Ok(page)
    }

    /// Group feed: posts belonging to one group, most recent first.
    pub async fn group(
        &self,
        group_id: GroupId,
        number: u64,
    ) -> Result<Page<PostModel>, FeedsServiceError> {
        self.paginate(
            Post::find()
                .filter(PostColumn::GroupId.eq(group_id))
                .order_by_desc(PostColumn::PubDate),
            number,
        )
        .await
    }

    /// Profile feed: one author's posts plus their stat block.
    pub async fn profile(
        &self,
        author_id: UserId,
        viewer_id: Option<UserId>,
        number: u64,
    ) -> Result<ProfileFeed, FeedsServiceError> {
        let page = self
            .paginate(
                Post::find()
                    .filter(PostColumn::AuthorId.eq(author_id))
                    .order_by_desc(PostColumn::PubDate),
                number,
            )
            .await?;

        let stats = self.author_stats(author_id, viewer_id).await?;

        Ok(ProfileFeed { page, stats })
    }

    /// Subscription feed: posts authored by anyone the viewer follows.
    pub async fn subscriptions(
        &self,
        viewer_id: UserId,
        number: u64,
    ) -> Result<Page<PostModel>, FeedsServiceError> {
        let authors: Vec<UserId> = Follow::find()
            .filter(FollowColumn::FollowerId.eq(viewer_id))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|f| f.author_id)
            .collect();

        if authors.is_empty() {
            return Ok(Page::empty(number.max(1)));
        }

        self.paginate(
            Post::find()
                .filter(PostColumn::AuthorId.is_in(authors))
                .order_by_desc(PostColumn::PubDate),
            number,
        )
        .await
    }

    /// Stat block for an author, relative to an optional viewer.
    pub async fn author_stats(
        &self,
        author_id: UserId,
        viewer_id: Option<UserId>,
    ) -> Result<AuthorStats, FeedsServiceError> {
        let posts_amount = Post::find()
            .filter(PostColumn::AuthorId.eq(author_id))
            .count(&self.db)
            .await?;

        let followers = Follow::find()
            .filter(FollowColumn::AuthorId.eq(author_id))
            .count(&self.db)
            .await?;

        let following = Follow::find()
            .filter(FollowColumn::FollowerId.eq(author_id))
            .count(&self.db)
            .await?;

        let is_followed = match viewer_id {
            Some(viewer_id) => {
                Follow::find()
                    .filter(FollowColumn::FollowerId.eq(viewer_id))
                    .filter(FollowColumn::AuthorId.eq(author_id))
                    .count(&self.db)
                    .await?
                    > 0
            }
            None => false,
        };

        Ok(AuthorStats {
            posts_amount,
            followers,
            following,
            is_followed,
        })
    }
}
