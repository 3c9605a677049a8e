#[cfg(test)]
mod entity_tests {
    use crate::entity::prelude::*;
    use crate::ids::*;
    use crate::models::migrator::Migrator;
    use sea_orm_migration::MigratorTrait;

    /// Test helper to create and migrate an in-memory database
    async fn setup_test_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");

        Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");

        db
    }

    async fn insert_user(db: &DatabaseConnection, username: &str) -> UserId {
        let user_id = UserId::new();
        let user = UserActiveModel {
            id: Set(user_id),
            username: Set(username.to_string()),
        };
        User::insert(user).exec(db).await.unwrap();
        user_id
    }

    async fn insert_post(db: &DatabaseConnection, author_id: UserId, text: &str) -> PostId {
        let post_id = PostId::new();
        let post = PostActiveModel {
            id: Set(post_id),
            author_id: Set(author_id),
            group_id: Set(None),
            text: Set(text.to_string()),
            image: Set(None),
            pub_date: Set(chrono::Utc::now().to_rfc3339()),
        };
        Post::insert(post).exec(db).await.unwrap();
        post_id
    }

    #[tokio::test]
    async fn test_create_and_find_post_with_image() {
        let db = setup_test_db().await;
        let author_id = insert_user(&db, "author").await;

        let post_id = PostId::new();
        let image_data = vec![1, 2, 3, 4, 5];
        let post = PostActiveModel {
            id: Set(post_id),
            author_id: Set(author_id),
            group_id: Set(None),
            text: Set("with an image".to_string()),
            image: Set(Some(image_data.clone())),
            pub_date: Set(chrono::Utc::now().to_rfc3339()),
        };
        Post::insert(post).exec(&db).await.unwrap();

        let found = Post::find_by_id(post_id).one(&db).await.unwrap().unwrap();

        assert_eq!(found.author_id, author_id);
        assert_eq!(found.image, Some(image_data));
    }

    #[tokio::test]
    async fn test_post_display_is_text_prefix() {
        let db = setup_test_db().await;
        let author_id = insert_user(&db, "author").await;
        let post_id = insert_post(&db, author_id, "a rather long post body").await;

        let post = Post::find_by_id(post_id).one(&db).await.unwrap().unwrap();
        assert_eq!(post.to_string(), "a rather long p");
    }

    #[tokio::test]
    async fn test_group_display_is_description() {
        let group = GroupModel {
            id: GroupId::new(),
            title: "Birds".to_string(),
            slug: "birds".to_string(),
            description: "Posts about birds".to_string(),
        };

        assert_eq!(group.to_string(), "Posts about birds");
    }

    #[tokio::test]
    async fn test_deleting_a_post_cascades_to_comments() {
        let db = setup_test_db().await;
        let author_id = insert_user(&db, "author").await;
        let post_id = insert_post(&db, author_id, "doomed").await;

        let comment = CommentActiveModel {
            id: Set(CommentId::new()),
            post_id: Set(post_id),
            author_id: Set(author_id),
            text: Set("attached".to_string()),
            created: Set(chrono::Utc::now().to_rfc3339()),
        };
        Comment::insert(comment).exec(&db).await.unwrap();

        Post::delete_by_id(post_id).exec(&db).await.unwrap();

        let remaining = Comment::find()
            .filter(CommentColumn::PostId.eq(post_id))
            .all(&db)
            .await
            .unwrap();
        assert!(remaining.is_empty(), "comments should be cascade deleted");
    }

    #[tokio::test]
    async fn test_duplicate_follow_pair_violates_unique_index() {
        let db = setup_test_db().await;
        let follower = insert_user(&db, "follower").await;
        let author = insert_user(&db, "author").await;

        let first = FollowActiveModel {
            id: Set(FollowId::new()),
            follower_id: Set(follower),
            author_id: Set(author),
        };
        Follow::insert(first).exec(&db).await.unwrap();

        let second = FollowActiveModel {
            id: Set(FollowId::new()),
            follower_id: Set(follower),
            author_id: Set(author),
        };
        let result = Follow::insert(second).exec(&db).await;

        assert!(result.is_err(), "second identical edge must be rejected");
    }

    #[tokio::test]
    async fn test_duplicate_username_violates_unique_index() {
        let db = setup_test_db().await;
        insert_user(&db, "taken").await;

        let dup = UserActiveModel {
            id: Set(UserId::new()),
            username: Set("taken".to_string()),
        };
        let result = User::insert(dup).exec(&db).await;

        assert!(result.is_err());
    }
}
