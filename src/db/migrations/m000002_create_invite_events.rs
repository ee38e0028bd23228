use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(InviteEvents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(InviteEvents::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(InviteEvents::ChatId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InviteEvents::EventType)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(ColumnDef::new(InviteEvents::ActorId).big_integer())
                    .col(ColumnDef::new(InviteEvents::TargetId).big_integer())
                    .col(ColumnDef::new(InviteEvents::InviteCreatorId).big_integer())
                    .col(ColumnDef::new(InviteEvents::InviteLink).text())
                    .col(ColumnDef::new(InviteEvents::CreatedAt).text().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-invite-events-chat-id")
                    .table(InviteEvents::Table)
                    .col(InviteEvents::ChatId)
                    .col((InviteEvents::Id, IndexOrder::Desc))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(InviteEvents::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum InviteEvents {
    Table,
    Id,
    ChatId,
    EventType,
    ActorId,
    TargetId,
    InviteCreatorId,
    InviteLink,
    CreatedAt,
}
