use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TelemetryLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TelemetryLogs::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    // Unix epoch milliseconds, set at ingestion time
                    .col(
                        ColumnDef::new(TelemetryLogs::Timestamp)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TelemetryLogs::MotorStatus)
                            .string_len(16)
                            .not_null()
                            .default("STATUS"),
                    )
                    .col(ColumnDef::new(TelemetryLogs::Voltage).double())
                    .col(ColumnDef::new(TelemetryLogs::Current).double())
                    .col(ColumnDef::new(TelemetryLogs::WaterLevel).double())
                    .col(ColumnDef::new(TelemetryLogs::Mode).string())
                    .col(ColumnDef::new(TelemetryLogs::Clock).string_len(32))
                    .col(ColumnDef::new(TelemetryLogs::RunTime).big_integer())
                    .col(
                        ColumnDef::new(TelemetryLogs::Command)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TelemetryLogs::DeviceIdentifier)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(TelemetryLogs::RawMessage).text().not_null())
                    .col(
                        ColumnDef::new(TelemetryLogs::SyncState)
                            .string_len(16)
                            .not_null()
                            .default("PENDING"),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("telemetry_logs_timestamp_idx")
                    .table(TelemetryLogs::Table)
                    .col(TelemetryLogs::Timestamp)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("telemetry_logs_sync_state_idx")
                    .table(TelemetryLogs::Table)
                    .col(TelemetryLogs::SyncState)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("telemetry_logs_device_idx")
                    .table(TelemetryLogs::Table)
                    .col(TelemetryLogs::DeviceIdentifier)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TelemetryLogs::Table).if_exists().to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum TelemetryLogs {
    Table,
    Id,
    Timestamp,
    MotorStatus,
    Voltage,
    Current,
    WaterLevel,
    Mode,
    Clock,
    RunTime,
    Command,
    DeviceIdentifier,
    RawMessage,
    SyncState,
}
