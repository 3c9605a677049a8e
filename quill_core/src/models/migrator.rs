use sea_orm_migration::prelude::*;

mod m20260114_000001_create_users_table;
mod m20260114_000002_create_groups_table;
mod m20260114_000003_create_posts_table;
mod m20260114_000004_create_comments_table;
mod m20260114_000005_create_follows_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260114_000001_create_users_table::Migration),
            Box::new(m20260114_000002_create_groups_table::Migration),
            Box::new(m20260114_000003_create_posts_table::Migration),
            Box::new(m20260114_000004_create_comments_table::Migration),
            Box::new(m20260114_000005_create_follows_table::Migration),
        ]
    }
}

#[cfg(test)]
use sea_orm::{Database, DbErr};

#[tokio::test]
async fn test_migrations_okay() -> Result<(), DbErr> {
    let db = Database::connect("sqlite:file::memory:?cache=shared").await?;
    let schema_manager = SchemaManager::new(&db);

    Migrator::refresh(&db).await?;

    assert!(schema_manager.has_table("user").await?);
    assert!(schema_manager.has_table("group").await?);
    assert!(schema_manager.has_table("post").await?);
    assert!(schema_manager.has_table("comment").await?);
    assert!(schema_manager.has_table("follow").await?);

    Ok(())
}
