//! Supplier entity holding the contact data of a vendor

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "suppliers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Supplier name (unique)
    #[sea_orm(unique)]
    pub name: String,

    /// Free-form status label, may be blank
    pub status: String,

    pub email: String,

    pub phone_number: String,

    pub postal_code: String,

    pub city: String,

    /// Street address
    pub address: String,
}

impl Model {
    /// The full way of addressing a supplier
    pub fn full_address(&self) -> String {
        format!(
            "{}, {}, {} {}",
            self.name, self.address, self.postal_code, self.city
        )
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Products sold by this supplier
    #[sea_orm(has_many = "super::product::Entity")]
    Products,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Products.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
