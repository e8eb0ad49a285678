use sea_orm_migration::prelude::*;

/// `id`, `created_at` and `updated_at`, shared by most tables
pub(crate) fn default_table_statement() -> TableCreateStatement {
    TableCreateStatement::new()
        .if_not_exists()
        .col(ColumnDef::new(DefaultColumn::Id)
            .uuid()
            .primary_key()
            .default(Expr::cust("GEN_RANDOM_UUID()"))
            .take())
        .col(ColumnDef::new(DefaultColumn::CreatedAt)
            .timestamp_with_time_zone()
            .not_null()
            .default(Expr::current_timestamp())
            .take())
        .col(ColumnDef::new(DefaultColumn::UpdatedAt)
            .timestamp_with_time_zone()
            .not_null()
            .default(Expr::current_timestamp())
            .take())
        .take()
}

#[derive(DeriveIden)]
pub(crate) enum DefaultColumn {
    Id,
    CreatedAt,
    UpdatedAt,
}

/// Foreign key from `table.column` to `target.id`
pub(crate) fn reference<T, C, R>(table: T, column: C, target: R, on_delete: ForeignKeyAction) -> ForeignKeyCreateStatement
where
    T: IntoTableRef,
    C: IntoIden,
    R: IntoTableRef,
{
    ForeignKeyCreateStatement::new()
        .from(table, column)
        .to(target, DefaultColumn::Id)
        .on_delete(on_delete)
        .on_update(ForeignKeyAction::Cascade)
        .take()
}
