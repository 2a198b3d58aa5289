use sea_orm_migration::{prelude::*, schema::*, sea_orm::sea_query::extension::postgres::Type};

use super::m20250301_000001_create_users::User;
use super::m20250301_000002_create_machinery::Machinery;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_type(
                Type::create()
                    .as_enum(DeliveryType::Enum)
                    .values([DeliveryType::SelfPickup, DeliveryType::OwnerDelivery])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Booking::Table)
                    .if_not_exists()
                    .col(uuid(Booking::Id).primary_key())
                    .col(uuid(Booking::MachineryId).not_null())
                    .col(uuid(Booking::UserId).not_null())
                    .col(string_len(Booking::UserPhone, 20).not_null())
                    .col(timestamp_with_time_zone(Booking::StartTime).not_null())
                    .col(timestamp_with_time_zone(Booking::EndTime).not_null())
                    .col(
                        ColumnDef::new(Booking::DeliveryType)
                            .custom(DeliveryType::Enum)
                            .not_null(),
                    )
                    .col(double(Booking::TotalPrice).not_null())
                    .col(
                        timestamp_with_time_zone(Booking::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_machinery")
                            .from(Booking::Table, Booking::MachineryId)
                            .to(Machinery::Table, Machinery::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_user")
                            .from(Booking::Table, Booking::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Booking::Table).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(DeliveryType::Enum).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Booking {
    Table,
    Id,
    MachineryId,
    UserId,
    UserPhone,
    StartTime,
    EndTime,
    DeliveryType,
    TotalPrice,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum DeliveryType {
    #[sea_orm(iden = "delivery_type")]
    Enum,
    #[sea_orm(iden = "self_pickup")]
    SelfPickup,
    #[sea_orm(iden = "owner_delivery")]
    OwnerDelivery,
}
