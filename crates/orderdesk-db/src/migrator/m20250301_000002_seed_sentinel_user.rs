//! Reserved account that inherits orders of deleted users

use sea_orm_migration::prelude::*;

use super::m20250301_000001_init_schema::User;
use crate::users::{SENTINEL_PASSWORD_HASH, SENTINEL_USERNAME};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let insert = Query::insert()
            .into_table(User::Table)
            .columns([
                User::Username,
                User::PasswordHash,
                User::IsActive,
                User::CreatedAt,
            ])
            .values_panic([
                SENTINEL_USERNAME.into(),
                SENTINEL_PASSWORD_HASH.into(),
                false.into(),
                chrono::Utc::now().into(),
            ])
            .to_owned();

        manager.exec_stmt(insert).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let delete = Query::delete()
            .from_table(User::Table)
            .and_where(Expr::col(User::Username).eq(SENTINEL_USERNAME))
            .to_owned();

        manager.exec_stmt(delete).await
    }
}
