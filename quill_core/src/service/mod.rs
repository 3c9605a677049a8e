pub mod comments;
pub mod feeds;
pub mod follows;
pub mod groups;
pub mod posts;
pub mod users;

use sea_orm::DatabaseConnection;

use crate::cache::FeedCache;

/// Everything a request handler needs, built once at startup.
#[derive(Clone)]
pub struct Services {
    pub users: users::UsersService,
    pub groups: groups::GroupsService,
    pub posts: posts::PostsService,
    pub comments: comments::CommentsService,
    pub follows: follows::FollowsService,
    pub feeds: feeds::FeedsService,
}

impl Services {
    pub fn new(db: DatabaseConnection, cache: FeedCache, page_size: u64) -> Self {
        Self {
            users: users::UsersService::new(db.clone()),
            groups: groups::GroupsService::new(db.clone()),
            posts: posts::PostsService::new(db.clone(), cache.clone()),
            comments: comments::CommentsService::new(db.clone()),
            follows: follows::FollowsService::new(db.clone()),
            feeds: feeds::FeedsService::new(db, cache, page_size),
        }
    }
}
