//! Group membership of a user

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Groups a user can belong to
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "lowercase")]
pub enum Group {
    /// Staff with full access to orders, suppliers and products
    #[sea_orm(string_value = "employee")]
    Employee,

    /// Buyer restricted to their own orders
    #[sea_orm(string_value = "customer")]
    Customer,
}

impl Group {
    pub fn as_str(&self) -> &'static str {
        match self {
            Group::Employee => "employee",
            Group::Customer => "customer",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_groups")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub user_id: i32,

    /// Group name; (user_id, group) is unique
    pub group: Group,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
