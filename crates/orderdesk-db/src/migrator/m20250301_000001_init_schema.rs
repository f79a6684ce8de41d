//! Initial schema: users, groups, suppliers, products, orders and line items

use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ============================================================
        // 1. Users and group memberships
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(User::Table)
                    .if_not_exists()
                    .col(pk_auto(User::Id))
                    .col(string_len(User::Username, 150).not_null().unique_key())
                    .col(string_len(User::PasswordHash, 255).not_null())
                    .col(boolean(User::IsActive).not_null().default(true))
                    .col(
                        timestamp_with_time_zone(User::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UserGroup::Table)
                    .if_not_exists()
                    .col(pk_auto(UserGroup::Id))
                    .col(integer(UserGroup::UserId).not_null())
                    .col(string_len(UserGroup::Group, 32).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_groups_user_id")
                            .from(UserGroup::Table, UserGroup::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_user_groups_user_group")
                    .table(UserGroup::Table)
                    .col(UserGroup::UserId)
                    .col(UserGroup::Group)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 2. Suppliers and products
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(Supplier::Table)
                    .if_not_exists()
                    .col(pk_auto(Supplier::Id))
                    .col(string_len(Supplier::Name, 50).not_null().unique_key())
                    .col(string_len(Supplier::Status, 30).not_null().default(""))
                    .col(string_len(Supplier::Email, 254).not_null())
                    .col(string_len(Supplier::PhoneNumber, 32).not_null())
                    .col(string_len(Supplier::PostalCode, 10).not_null())
                    .col(string_len(Supplier::City, 50).not_null())
                    .col(string_len(Supplier::Address, 70).not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Product::Table)
                    .if_not_exists()
                    .col(pk_auto(Product::Id))
                    .col(string_len(Product::Name, 100).not_null())
                    .col(string_len(Product::Category, 32).not_null())
                    .col(decimal_len(Product::Price, 10, 2).not_null())
                    .col(integer(Product::SupplierId).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_products_supplier_id")
                            .from(Product::Table, Product::SupplierId)
                            .to(Supplier::Table, Supplier::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_products_supplier_id")
                    .table(Product::Table)
                    .col(Product::SupplierId)
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 3. Orders and line items
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(Order::Table)
                    .if_not_exists()
                    .col(pk_auto(Order::Id))
                    .col(integer(Order::OwnerId).not_null())
                    .col(
                        timestamp_with_time_zone(Order::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(boolean(Order::IsFinished).not_null().default(false))
                    .col(timestamp_with_time_zone_null(Order::FinishDate))
                    .col(boolean(Order::IsSent).not_null().default(false))
                    .col(timestamp_with_time_zone_null(Order::SentDate))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_orders_owner_id")
                            .from(Order::Table, Order::OwnerId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_orders_owner_id")
                    .table(Order::Table)
                    .col(Order::OwnerId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(OrderLineItem::Table)
                    .if_not_exists()
                    .col(pk_auto(OrderLineItem::Id))
                    .col(integer(OrderLineItem::OrderId).not_null())
                    .col(integer(OrderLineItem::ProductId).not_null())
                    .col(integer(OrderLineItem::Amount).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_order_line_items_order_id")
                            .from(OrderLineItem::Table, OrderLineItem::OrderId)
                            .to(Order::Table, Order::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_order_line_items_product_id")
                            .from(OrderLineItem::Table, OrderLineItem::ProductId)
                            .to(Product::Table, Product::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One line item per product within an order
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_order_line_items_order_product")
                    .table(OrderLineItem::Table)
                    .col(OrderLineItem::OrderId)
                    .col(OrderLineItem::ProductId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OrderLineItem::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Order::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Product::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Supplier::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(UserGroup::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(User::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
pub(super) enum User {
    #[sea_orm(iden = "users")]
    Table,
    Id,
    Username,
    PasswordHash,
    IsActive,
    CreatedAt,
}

#[derive(DeriveIden)]
enum UserGroup {
    #[sea_orm(iden = "user_groups")]
    Table,
    Id,
    UserId,
    Group,
}

#[derive(DeriveIden)]
enum Supplier {
    #[sea_orm(iden = "suppliers")]
    Table,
    Id,
    Name,
    Status,
    Email,
    PhoneNumber,
    PostalCode,
    City,
    Address,
}

#[derive(DeriveIden)]
enum Product {
    #[sea_orm(iden = "products")]
    Table,
    Id,
    Name,
    Category,
    Price,
    SupplierId,
}

#[derive(DeriveIden)]
enum Order {
    #[sea_orm(iden = "orders")]
    Table,
    Id,
    OwnerId,
    CreatedAt,
    IsFinished,
    FinishDate,
    IsSent,
    SentDate,
}

#[derive(DeriveIden)]
enum OrderLineItem {
    #[sea_orm(iden = "order_line_items")]
    Table,
    Id,
    OrderId,
    ProductId,
    Amount,
}
