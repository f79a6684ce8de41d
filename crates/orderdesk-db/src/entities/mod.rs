//! Database entities

pub mod order;
pub mod order_line_item;
pub mod product;
pub mod supplier;
pub mod user;
pub mod user_group;

pub use order::Entity as Order;
pub use order_line_item::Entity as OrderLineItem;
pub use product::Entity as Product;
pub use supplier::Entity as Supplier;
pub use user::Entity as User;
pub use user_group::Entity as UserGroup;

pub mod prelude {
    pub use super::order::Entity as Order;
    pub use super::order_line_item::Entity as OrderLineItem;
    pub use super::product::Entity as Product;
    pub use super::supplier::Entity as Supplier;
    pub use super::user::Entity as User;
    pub use super::user_group::Entity as UserGroup;
}
