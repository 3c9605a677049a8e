//! Request handlers.
//!
//! Each handler is a plain async function taking the service bundle and the
//! viewer the identity collaborator resolved for the request. Handlers never
//! read an author out of a submission; ownership and login checks happen
//! here, at the controller boundary.

use validator::{Validate, ValidationErrors};

use crate::{
    entity::prelude::*,
    error::ViewError,
    forms::{self, CommentForm, PostForm},
    ids::PostId,
    service::{
        feeds::{page_number, AuthorStats, Page},
        Services,
    },
};

/// The identity the auth collaborator resolved for this request.
pub type Viewer<'a> = Option<&'a UserModel>;

/// What a handler hands back to the rendering collaborator.
#[derive(Debug)]
pub enum Outcome<T> {
    Render(T),
    Redirect(String),
}

impl<T> Outcome<T> {
    pub fn redirect_target(&self) -> Option<&str> {
        match self {
            Outcome::Redirect(target) => Some(target),
            Outcome::Render(_) => None,
        }
    }
}

/// Canonical paths, shared by redirects and templates.
pub mod urls {
    use crate::ids::PostId;

    pub fn index() -> String {
        "/".to_string()
    }

    pub fn group(slug: &str) -> String {
        format!("/group/{}/", slug)
    }

    pub fn new_post() -> String {
        "/new/".to_string()
    }

    pub fn profile(username: &str) -> String {
        format!("/{}/", username)
    }

    pub fn post(username: &str, post_id: PostId) -> String {
        format!("/{}/{}/", username, post_id)
    }

    pub fn post_edit(username: &str, post_id: PostId) -> String {
        format!("/{}/{}/edit/", username, post_id)
    }

    pub fn follow_index() -> String {
        "/follow/".to_string()
    }

    pub fn profile_follow(username: &str) -> String {
        format!("/{}/follow/", username)
    }

    pub fn profile_unfollow(username: &str) -> String {
        format!("/{}/unfollow/", username)
    }

    pub fn login(next: &str) -> String {
        format!("/auth/login/?next={}", next)
    }
}

// ---------------
// View contexts
// ---------------

#[derive(Debug)]
pub struct IndexPage {
    pub page: Page<PostModel>,
}

#[derive(Debug)]
pub struct GroupPage {
    pub group: GroupModel,
    pub page: Page<PostModel>,
}

#[derive(Debug)]
pub struct ProfilePage {
    pub author: UserModel,
    pub page: Page<PostModel>,
    pub stats: AuthorStats,
}

#[derive(Debug)]
pub struct CommentFormContext {
    pub form: CommentForm,
    pub errors: ValidationErrors,
}

#[derive(Debug)]
pub struct PostPage {
    pub post: PostModel,
    pub author: UserModel,
    pub comments: Vec<CommentModel>,
    pub stats: AuthorStats,
    /// Inline comment form; present only for authenticated viewers.
    pub comment_form: Option<CommentFormContext>,
}

#[derive(Debug)]
pub struct PostFormPage {
    pub form: PostForm,
    pub errors: ValidationErrors,
    /// Choice list for the group field.
    pub groups: Vec<GroupModel>,
    pub is_edit: bool,
    /// The post being edited, when `is_edit`.
    pub post: Option<PostModel>,
}

#[derive(Debug)]
pub struct FollowPage {
    pub page: Page<PostModel>,
}

// ---------------
// Handlers
// ---------------

/// `GET /` — global feed.
pub async fn index(svc: &Services, page: Option<&str>) -> Result<IndexPage, ViewError> {
    let page = svc.feeds.index(page_number(page)).await?;

    Ok(IndexPage { page })
}

/// `GET /group/<slug>/` — one group's feed.
pub async fn group_posts(
    svc: &Services,
    slug: &str,
    page: Option<&str>,
) -> Result<GroupPage, ViewError> {
    let group = svc.groups.get_by_slug(slug).await?;
    let page = svc.feeds.group(group.id, page_number(page)).await?;

    Ok(GroupPage { group, page })
}

/// `GET /<username>/` — an author's posts and stat block.
pub async fn profile(
    svc: &Services,
    viewer: Viewer<'_>,
    username: &str,
    page: Option<&str>,
) -> Result<ProfilePage, ViewError> {
    let author = svc.users.get_by_username(username).await?;
    let feed = svc
        .feeds
        .profile(author.id, viewer.map(|v| v.id), page_number(page))
        .await?;

    Ok(ProfilePage {
        author,
        page: feed.page,
        stats: feed.stats,
    })
}

/// `GET|POST /<username>/<post_id>/` — a single post with its comments.
///
/// An authenticated viewer gets the inline comment form, and a submission
/// is accepted in the same request cycle.
pub async fn post_view(
    svc: &Services,
    viewer: Viewer<'_>,
    username: &str,
    post_id: PostId,
    submission: Option<&CommentForm>,
) -> Result<Outcome<PostPage>, ViewError> {
    let post = svc.posts.get_for_author(username, post_id).await?;

    if let (Some(user), Some(form)) = (viewer, submission) {
        if form.validate().is_ok() {
            svc.comments.create(post.id, user.id, form).await?;
            return Ok(Outcome::Redirect(urls::post(username, post_id)));
        }
    }

    let page = post_page(svc, viewer, post, submission).await?;
    Ok(Outcome::Render(page))
}

/// `GET|POST /new/` — create a post.
pub async fn new_post(
    svc: &Services,
    viewer: Viewer<'_>,
    submission: Option<&PostForm>,
) -> Result<Outcome<PostFormPage>, ViewError> {
    let Some(user) = viewer else {
        return Ok(Outcome::Redirect(urls::login(&urls::new_post())));
    };

    let groups = svc.groups.list().await?;

    let Some(form) = submission else {
        return Ok(Outcome::Render(PostFormPage {
            form: PostForm::default(),
            errors: ValidationErrors::new(),
            groups,
            is_edit: false,
            post: None,
        }));
    };

    let errors = validate_post_form(svc, form).await?;
    if !errors.is_empty() {
        return Ok(Outcome::Render(PostFormPage {
            form: form.clone(),
            errors,
            groups,
            is_edit: false,
            post: None,
        }));
    }

    svc.posts.create(user.id, form).await?;

    Ok(Outcome::Redirect(urls::index()))
}

/// `GET|POST /<username>/<post_id>/edit/` — edit a post.
///
/// A viewer who is not the author is redirected to the post page without
/// any change; that is policy, not an error.
pub async fn post_edit(
    svc: &Services,
    viewer: Viewer<'_>,
    username: &str,
    post_id: PostId,
    submission: Option<&PostForm>,
) -> Result<Outcome<PostFormPage>, ViewError> {
    let Some(user) = viewer else {
        return Ok(Outcome::Redirect(urls::login(&urls::post_edit(
            username, post_id,
        ))));
    };

    let post = svc.posts.get_for_author(username, post_id).await?;
    let post_url = urls::post(username, post_id);

    if post.author_id != user.id {
        return Ok(Outcome::Redirect(post_url));
    }

    let groups = svc.groups.list().await?;

    let Some(form) = submission else {
        return Ok(Outcome::Render(PostFormPage {
            form: PostForm::from_post(&post),
            errors: ValidationErrors::new(),
            groups,
            is_edit: true,
            post: Some(post),
        }));
    };

    let errors = validate_post_form(svc, form).await?;
    if !errors.is_empty() {
        return Ok(Outcome::Render(PostFormPage {
            form: form.clone(),
            errors,
            groups,
            is_edit: true,
            post: Some(post),
        }));
    }

    svc.posts.update(post, form).await?;

    Ok(Outcome::Redirect(post_url))
}

/// `POST /<username>/<post_id>/comment` — add a comment.
pub async fn add_comment(
    svc: &Services,
    viewer: Viewer<'_>,
    username: &str,
    post_id: PostId,
    form: &CommentForm,
) -> Result<Outcome<PostPage>, ViewError> {
    let Some(user) = viewer else {
        return Ok(Outcome::Redirect(urls::login(&urls::post(
            username, post_id,
        ))));
    };

    let post = svc.posts.get(post_id).await?;

    if form.validate().is_ok() {
        svc.comments.create(post.id, user.id, form).await?;
        return Ok(Outcome::Redirect(urls::post(username, post_id)));
    }

    let page = post_page(svc, viewer, post, Some(form)).await?;
    Ok(Outcome::Render(page))
}

/// `GET /follow/` — posts from followed authors only.
pub async fn follow_index(
    svc: &Services,
    viewer: Viewer<'_>,
    page: Option<&str>,
) -> Result<Outcome<FollowPage>, ViewError> {
    let Some(user) = viewer else {
        return Ok(Outcome::Redirect(urls::login(&urls::follow_index())));
    };

    let page = svc.feeds.subscriptions(user.id, page_number(page)).await?;

    Ok(Outcome::Render(FollowPage { page }))
}

/// `GET /<username>/follow/` — subscribe, then bounce back.
///
/// Always lands on the referring page; subscribing to yourself or to an
/// author you already follow is a no-op.
pub async fn profile_follow(
    svc: &Services,
    viewer: Viewer<'_>,
    username: &str,
    referer: Option<&str>,
) -> Result<String, ViewError> {
    let Some(user) = viewer else {
        return Ok(urls::login(&urls::profile_follow(username)));
    };

    let back = referer
        .map(str::to_owned)
        .unwrap_or_else(|| urls::profile(username));

    if user.username == username {
        return Ok(back);
    }

    let author = svc.users.get_by_username(username).await?;
    svc.follows.follow(user.id, author.id).await?;

    Ok(back)
}

/// `GET /<username>/unfollow/` — unsubscribe, then bounce back.
pub async fn profile_unfollow(
    svc: &Services,
    viewer: Viewer<'_>,
    username: &str,
    referer: Option<&str>,
) -> Result<String, ViewError> {
    let Some(user) = viewer else {
        return Ok(urls::login(&urls::profile_unfollow(username)));
    };

    let back = referer
        .map(str::to_owned)
        .unwrap_or_else(|| urls::profile(username));

    let author = svc.users.get_by_username(username).await?;
    svc.follows.unfollow(user.id, author.id).await?;

    Ok(back)
}

// ---------------
// Shared pieces
// ---------------

async fn post_page(
    svc: &Services,
    viewer: Viewer<'_>,
    post: PostModel,
    submission: Option<&CommentForm>,
) -> Result<PostPage, ViewError> {
    let author = svc.users.get(post.author_id).await?;
    let comments = svc.comments.list_for_post(post.id).await?;
    let stats = svc
        .feeds
        .author_stats(post.author_id, viewer.map(|v| v.id))
        .await?;

    let comment_form = viewer.map(|_| match submission {
        Some(form) => CommentFormContext {
            form: form.clone(),
            errors: form.validate().err().unwrap_or_else(ValidationErrors::new),
        },
        None => CommentFormContext {
            form: CommentForm::default(),
            errors: ValidationErrors::new(),
        },
    });

    Ok(PostPage {
        post,
        author,
        comments,
        stats,
        comment_form,
    })
}

async fn validate_post_form(
    svc: &Services,
    form: &PostForm,
) -> Result<ValidationErrors, ViewError> {
    let mut errors = form.validate().err().unwrap_or_else(ValidationErrors::new);

    if let Some(group_id) = form.group {
        if !svc.groups.exists(group_id).await? {
            forms::unknown_group(&mut errors);
        }
    }

    Ok(errors)
}
