use aequora_persistence::entity::{
    authoritycommunity, booking, eventparticipation, issuevote, notification,
};
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .name("uk_issuevote_issue_resident")
                    .table(issuevote::Entity)
                    .col(issuevote::Column::IssueId)
                    .col(issuevote::Column::ResidentId)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uk_eventparticipation_event_resident")
                    .table(eventparticipation::Entity)
                    .col(eventparticipation::Column::EventId)
                    .col(eventparticipation::Column::ResidentId)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uk_authoritycommunity_authority_community")
                    .table(authoritycommunity::Entity)
                    .col(authoritycommunity::Column::AuthorityId)
                    .col(authoritycommunity::Column::CommunityId)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // Lookup paths of the duplicate-booking guard and the notification inbox
        manager
            .create_index(
                Index::create()
                    .name("idx_booking_resident_service")
                    .table(booking::Entity)
                    .col(booking::Column::ResidentId)
                    .col(booking::Column::ServiceId)
                    .col(booking::Column::ServiceDate)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_notification_user")
                    .table(notification::Entity)
                    .col(notification::Column::UserId)
                    .col(notification::Column::IsRead)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, _manager: &SchemaManager) -> Result<(), DbErr> {
        // Indexes go away with their tables in the previous migration's down
        Ok(())
    }
}
