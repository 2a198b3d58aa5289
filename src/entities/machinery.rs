use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A rentable piece of farm machinery.
///
/// `owner_name` and `owner_phone` are a snapshot of the owner's profile taken
/// when the listing is created.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "machinery")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price_per_hour: f64,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub owner_name: String,
    pub owner_phone: String,
    pub image_url: Option<String>,
    pub available_from: DateTimeWithTimeZone,
    pub available_to: DateTimeWithTimeZone,
    pub delivery_available: bool,
    pub delivery_charge: Option<f64>,
    pub is_available: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: Option<DateTimeWithTimeZone>,
}

impl Model {
    pub fn location(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::OwnerId",
        to = "super::user::Column::Id"
    )]
    Owner,
    #[sea_orm(has_many = "super::booking::Entity")]
    Bookings,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Related<super::booking::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bookings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
