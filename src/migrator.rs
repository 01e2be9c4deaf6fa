use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_books_table::Migration),
            Box::new(m20240101_000002_create_students_table::Migration),
            Box::new(m20240101_000003_create_issued_books_table::Migration),
        ]
    }
}

mod m20240101_000001_create_books_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_books_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Books::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Books::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Books::Title).string_len(200).not_null())
                        .col(ColumnDef::new(Books::Author).string_len(200).not_null())
                        .col(
                            ColumnDef::new(Books::Isbn)
                                .string_len(13)
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(Books::Quantity)
                                .integer()
                                .not_null()
                                .default(1),
                        )
                        .col(
                            ColumnDef::new(Books::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Books::UpdatedAt)
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
                        .name("idx_books_created_at")
                        .table(Books::Table)
                        .col(Books::CreatedAt)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Books::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Books {
        Table,
        Id,
        Title,
        Author,
        Isbn,
        Quantity,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000002_create_students_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_students_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Students::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Students::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Students::Name).string_len(200).not_null())
                        .col(
                            ColumnDef::new(Students::IdNumber)
                                .string_len(20)
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(Students::Department)
                                .string_len(20)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Students::PhoneNumber)
                                .string_len(20)
                                .not_null()
                                .default(""),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_students_name")
                        .table(Students::Table)
                        .col(Students::Name)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Students::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Students {
        Table,
        Id,
        Name,
        IdNumber,
        Department,
        PhoneNumber,
    }
}

mod m20240101_000003_create_issued_books_table {
    use super::m20240101_000001_create_books_table::Books;
    use super::m20240101_000002_create_students_table::Students;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_issued_books_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(IssuedBooks::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(IssuedBooks::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(IssuedBooks::BookId).integer().not_null())
                        .col(ColumnDef::new(IssuedBooks::StudentId).integer().not_null())
                        .col(
                            ColumnDef::new(IssuedBooks::Quantity)
                                .integer()
                                .not_null()
                                .default(1),
                        )
                        .col(ColumnDef::new(IssuedBooks::IssueDate).date().not_null())
                        .col(ColumnDef::new(IssuedBooks::ReturnDate).date().null())
                        .col(
                            ColumnDef::new(IssuedBooks::IsReturned)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(IssuedBooks::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(IssuedBooks::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_issued_books_book_id")
                                .from(IssuedBooks::Table, IssuedBooks::BookId)
                                .to(Books::Table, Books::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_issued_books_student_id")
                                .from(IssuedBooks::Table, IssuedBooks::StudentId)
                                .to(Students::Table, Students::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_issued_books_book_id")
                        .table(IssuedBooks::Table)
                        .col(IssuedBooks::BookId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_issued_books_student_id")
                        .table(IssuedBooks::Table)
                        .col(IssuedBooks::StudentId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_issued_books_is_returned")
                        .table(IssuedBooks::Table)
                        .col(IssuedBooks::IsReturned)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(IssuedBooks::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum IssuedBooks {
        Table,
        Id,
        BookId,
        StudentId,
        Quantity,
        IssueDate,
        ReturnDate,
        IsReturned,
        CreatedAt,
        UpdatedAt,
    }
}
