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
                    .table(Machinery::Table)
                    .if_not_exists()
                    .col(uuid(Machinery::Id).primary_key())
                    .col(uuid(Machinery::OwnerId).not_null())
                    .col(string_len(Machinery::Name, 100).not_null())
                    .col(text_null(Machinery::Description))
                    .col(double(Machinery::PricePerHour).not_null())
                    .col(double_null(Machinery::Latitude))
                    .col(double_null(Machinery::Longitude))
                    .col(string_len(Machinery::OwnerName, 100).not_null())
                    .col(string_len(Machinery::OwnerPhone, 20).not_null())
                    .col(string_null(Machinery::ImageUrl))
                    .col(timestamp_with_time_zone(Machinery::AvailableFrom).not_null())
                    .col(timestamp_with_time_zone(Machinery::AvailableTo).not_null())
                    .col(boolean(Machinery::DeliveryAvailable).not_null().default(false))
                    .col(double_null(Machinery::DeliveryCharge))
                    .col(boolean(Machinery::IsAvailable).not_null().default(true))
                    .col(
                        timestamp_with_time_zone(Machinery::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(timestamp_with_time_zone_null(Machinery::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_machinery_owner")
                            .from(Machinery::Table, Machinery::OwnerId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_machinery_owner")
                    .table(Machinery::Table)
                    .col(Machinery::OwnerId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Machinery::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Machinery {
    Table,
    Id,
    OwnerId,
    Name,
    Description,
    PricePerHour,
    Latitude,
    Longitude,
    OwnerName,
    OwnerPhone,
    ImageUrl,
    AvailableFrom,
    AvailableTo,
    DeliveryAvailable,
    DeliveryCharge,
    IsAvailable,
    CreatedAt,
    UpdatedAt,
}
