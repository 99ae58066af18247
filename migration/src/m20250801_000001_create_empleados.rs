use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Empleados {
    Table,
    NationalId,
    Name,
    Sex,
    Category,
    YearsOfService,
    Salary,
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
                    .table(Empleados::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Empleados::NationalId)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Empleados::Name).string_len(256).not_null())
                    // Single-character column instead of a native enum so the
                    // schema also applies on the SQLite test backend.
                    .col(ColumnDef::new(Empleados::Sex).string_len(1).not_null())
                    .col(ColumnDef::new(Empleados::Category).integer().not_null())
                    .col(
                        ColumnDef::new(Empleados::YearsOfService)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Empleados::Salary).integer().not_null())
                    .col(
                        ColumnDef::new(Empleados::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_empleados_category")
                    .table(Empleados::Table)
                    .col(Empleados::Category)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Empleados::Table).to_owned())
            .await
    }
}
