use sea_orm_migration::{prelude::*, schema::*};

use super::m20250301_000001_create_users::User;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Vegetable::Table)
                    .if_not_exists()
                    .col(uuid(Vegetable::Id).primary_key())
                    .col(uuid(Vegetable::SellerId).not_null())
                    .col(string_len(Vegetable::VegName, 100).not_null())
                    .col(string_len(Vegetable::Category, 50).not_null())
                    .col(double(Vegetable::Quantity).not_null())
                    .col(double(Vegetable::Rate).not_null())
                    .col(string_null(Vegetable::ImageUrl))
                    .col(text_null(Vegetable::Description))
                    .col(
                        timestamp_with_time_zone(Vegetable::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_vegetable_seller")
                            .from(Vegetable::Table, Vegetable::SellerId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Vegetable::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Vegetable {
    Table,
    Id,
    SellerId,
    VegName,
    Category,
    Quantity,
    Rate,
    ImageUrl,
    Description,
    CreatedAt,
}
