//! User and group-membership queries shared by the API and the CLI

use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::info;

use crate::entities::{order, user, user_group, user_group::Group};

/// Username of the reserved account that inherits orders of deleted users
pub const SENTINEL_USERNAME: &str = "deleted";

/// Password hash stored for the sentinel account; never a valid PHC string
pub const SENTINEL_PASSWORD_HASH: &str = "!";

/// Look up the sentinel account created by the migrations
pub async fn find_sentinel<C: ConnectionTrait>(db: &C) -> Result<user::Model, DbErr> {
    user::Entity::find()
        .filter(user::Column::Username.eq(SENTINEL_USERNAME))
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("sentinel user '{}'", SENTINEL_USERNAME)))
}

pub async fn find_by_username<C: ConnectionTrait>(
    db: &C,
    username: &str,
) -> Result<Option<user::Model>, DbErr> {
    user::Entity::find()
        .filter(user::Column::Username.eq(username))
        .one(db)
        .await
}

/// Groups the user belongs to, in a stable order
pub async fn groups_of<C: ConnectionTrait>(db: &C, user_id: i32) -> Result<Vec<Group>, DbErr> {
    let memberships = user_group::Entity::find()
        .filter(user_group::Column::UserId.eq(user_id))
        .order_by_asc(user_group::Column::Id)
        .all(db)
        .await?;

    let mut groups: Vec<Group> = Vec::with_capacity(memberships.len());
    for membership in memberships {
        if !groups.contains(&membership.group) {
            groups.push(membership.group);
        }
    }

    Ok(groups)
}

/// Insert a user together with its group memberships in one transaction
pub async fn create_user<C>(
    db: &C,
    username: &str,
    password_hash: &str,
    groups: &[Group],
) -> Result<user::Model, DbErr>
where
    C: ConnectionTrait + TransactionTrait,
{
    let txn = db.begin().await?;

    let created = user::ActiveModel {
        username: Set(username.to_string()),
        password_hash: Set(password_hash.to_string()),
        is_active: Set(true),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let mut seen: Vec<Group> = Vec::new();
    for group in groups {
        if seen.contains(group) {
            continue;
        }
        seen.push(*group);

        user_group::ActiveModel {
            user_id: Set(created.id),
            group: Set(*group),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
    }

    txn.commit().await?;

    info!(
        "Created user '{}' (id {}) in groups {:?}",
        created.username, created.id, seen
    );

    Ok(created)
}

/// Delete a user, handing its orders over to the sentinel account
///
/// Returns the number of orders that changed owner.
pub async fn delete_user<C>(db: &C, user_id: i32) -> Result<u64, DbErr>
where
    C: ConnectionTrait + TransactionTrait,
{
    let txn = db.begin().await?;

    let sentinel = find_sentinel(&txn).await?;
    if sentinel.id == user_id {
        return Err(DbErr::Custom("the sentinel user cannot be deleted".to_string()));
    }

    let reassigned = order::Entity::update_many()
        .col_expr(order::Column::OwnerId, Expr::value(sentinel.id))
        .filter(order::Column::OwnerId.eq(user_id))
        .exec(&txn)
        .await?
        .rows_affected;

    let deleted = user::Entity::delete_by_id(user_id).exec(&txn).await?;
    if deleted.rows_affected == 0 {
        return Err(DbErr::RecordNotFound(format!("user {}", user_id)));
    }

    txn.commit().await?;

    info!(
        "Deleted user {} and reassigned {} order(s) to '{}'",
        user_id, reassigned, SENTINEL_USERNAME
    );

    Ok(reassigned)
}
