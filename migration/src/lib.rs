pub use sea_orm_migration::prelude::*;

mod m20260901_000001_create_users;
mod m20260901_000002_create_booking_tables;
mod m20260901_000003_create_consistency_issues;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260901_000001_create_users::Migration),
            Box::new(m20260901_000002_create_booking_tables::Migration),
            Box::new(m20260901_000003_create_consistency_issues::Migration),
        ]
    }
}
