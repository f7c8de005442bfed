use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Services {
    Table,
    Id,
    VendorId,
    Name,
    Price,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Bookings {
    Table,
    Id,
    ServiceId,
    UserId,
    SlotKey,
    ScheduledAt,
    Status,
    Price,
    DecidedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Transactions {
    Table,
    Id,
    BookingId,
    UserId,
    Price,
    Status,
    CreatedAt,
    UpdatedAt,
}

/// 时段占用表：(service_id, slot_key) 主键保证同一时段只有一个未被拒绝的预约
#[derive(DeriveIden)]
enum SlotReservations {
    Table,
    ServiceId,
    SlotKey,
    BookingId,
    CreatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Services::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Services::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Services::VendorId).uuid().not_null())
                    .col(ColumnDef::new(Services::Name).string_len(100).not_null())
                    .col(ColumnDef::new(Services::Price).big_integer().not_null())
                    .col(
                        ColumnDef::new(Services::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Bookings::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Bookings::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Bookings::ServiceId).uuid().not_null())
                    .col(ColumnDef::new(Bookings::UserId).uuid().not_null())
                    .col(ColumnDef::new(Bookings::SlotKey).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Bookings::ScheduledAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Bookings::Status).string_len(16).not_null())
                    .col(ColumnDef::new(Bookings::Price).big_integer().not_null())
                    .col(ColumnDef::new(Bookings::DecidedBy).uuid().null())
                    .col(
                        ColumnDef::new(Bookings::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Bookings::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_bookings_user_created")
                    .table(Bookings::Table)
                    .col(Bookings::UserId)
                    .col(Bookings::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_bookings_service_slot")
                    .table(Bookings::Table)
                    .col(Bookings::ServiceId)
                    .col(Bookings::SlotKey)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_bookings_status")
                    .table(Bookings::Table)
                    .col(Bookings::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transactions::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Transactions::BookingId).uuid().not_null())
                    .col(ColumnDef::new(Transactions::UserId).uuid().not_null())
                    .col(ColumnDef::new(Transactions::Price).big_integer().not_null())
                    .col(ColumnDef::new(Transactions::Status).string_len(16).not_null())
                    .col(
                        ColumnDef::new(Transactions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transactions::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 一个预约只对应一笔交易
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_transactions_booking_unique")
                    .table(Transactions::Table)
                    .col(Transactions::BookingId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_transactions_user_created")
                    .table(Transactions::Table)
                    .col(Transactions::UserId)
                    .col(Transactions::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SlotReservations::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(SlotReservations::ServiceId).uuid().not_null())
                    .col(
                        ColumnDef::new(SlotReservations::SlotKey)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(SlotReservations::BookingId).uuid().not_null())
                    .col(
                        ColumnDef::new(SlotReservations::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(SlotReservations::ServiceId)
                            .col(SlotReservations::SlotKey),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_slot_reservations_booking_unique")
                    .table(SlotReservations::Table)
                    .col(SlotReservations::BookingId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(SlotReservations::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(Transactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(Bookings::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(Services::Table).to_owned())
            .await?;
        Ok(())
    }
}
