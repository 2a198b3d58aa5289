pub use sea_orm_migration::prelude::*;

mod m20250301_000001_create_users;
mod m20250301_000002_create_machinery;
mod m20250301_000003_create_bookings;
mod m20250301_000004_create_vegetables;
mod m20250301_000005_create_notifications;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_users::Migration),
            Box::new(m20250301_000002_create_machinery::Migration),
            Box::new(m20250301_000003_create_bookings::Migration),
            Box::new(m20250301_000004_create_vegetables::Migration),
            Box::new(m20250301_000005_create_notifications::Migration),
        ]
    }
}
