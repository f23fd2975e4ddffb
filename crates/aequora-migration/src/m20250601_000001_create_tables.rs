use aequora_persistence::entity::*;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::{EntityTrait, Schema};

#[derive(DeriveMigrationName)]
pub struct Migration;

async fn create_table_for<E>(manager: &SchemaManager<'_>, schema: &Schema, entity: E) -> Result<(), DbErr>
where
    E: EntityTrait,
{
    manager
        .create_table(schema.create_table_from_entity(entity).if_not_exists().to_owned())
        .await
}

async fn drop_table_for<E>(manager: &SchemaManager<'_>, entity: E) -> Result<(), DbErr>
where
    E: EntityTrait,
{
    manager
        .drop_table(Table::drop().table(entity).if_exists().to_owned())
        .await
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let schema = Schema::new(manager.get_database_backend());

        // Referenced tables first
        create_table_for(manager, &schema, community::Entity).await?;
        create_table_for(manager, &schema, user::Entity).await?;
        create_table_for(manager, &schema, user_email::Entity).await?;
        create_table_for(manager, &schema, user_phonenumber::Entity).await?;
        create_table_for(manager, &schema, resident::Entity).await?;
        create_table_for(manager, &schema, authority::Entity).await?;
        create_table_for(manager, &schema, authoritycommunity::Entity).await?;
        create_table_for(manager, &schema, serviceprovider::Entity).await?;
        create_table_for(manager, &schema, issuereport::Entity).await?;
        create_table_for(manager, &schema, issuevote::Entity).await?;
        create_table_for(manager, &schema, issueassignment::Entity).await?;
        create_table_for(manager, &schema, event::Entity).await?;
        create_table_for(manager, &schema, eventparticipation::Entity).await?;
        create_table_for(manager, &schema, emergencyreport::Entity).await?;
        create_table_for(manager, &schema, service::Entity).await?;
        create_table_for(manager, &schema, booking::Entity).await?;
        create_table_for(manager, &schema, payment::Entity).await?;
        create_table_for(manager, &schema, review::Entity).await?;
        create_table_for(manager, &schema, notification::Entity).await?;
        create_table_for(manager, &schema, loginlog::Entity).await?;
        create_table_for(manager, &schema, activitylog::Entity).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        drop_table_for(manager, activitylog::Entity).await?;
        drop_table_for(manager, loginlog::Entity).await?;
        drop_table_for(manager, notification::Entity).await?;
        drop_table_for(manager, review::Entity).await?;
        drop_table_for(manager, payment::Entity).await?;
        drop_table_for(manager, booking::Entity).await?;
        drop_table_for(manager, service::Entity).await?;
        drop_table_for(manager, emergencyreport::Entity).await?;
        drop_table_for(manager, eventparticipation::Entity).await?;
        drop_table_for(manager, event::Entity).await?;
        drop_table_for(manager, issueassignment::Entity).await?;
        drop_table_for(manager, issuevote::Entity).await?;
        drop_table_for(manager, issuereport::Entity).await?;
        drop_table_for(manager, serviceprovider::Entity).await?;
        drop_table_for(manager, authoritycommunity::Entity).await?;
        drop_table_for(manager, authority::Entity).await?;
        drop_table_for(manager, resident::Entity).await?;
        drop_table_for(manager, user_phonenumber::Entity).await?;
        drop_table_for(manager, user_email::Entity).await?;
        drop_table_for(manager, user::Entity).await?;
        drop_table_for(manager, community::Entity).await?;

        Ok(())
    }
}
