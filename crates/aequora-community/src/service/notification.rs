//! Notification side-effects and inbox operations

use sea_orm::{prelude::Expr, *};

use aequora_auth::Principal;
use aequora_common::AequoraError;
use aequora_persistence::entity::sea_orm_active_enums::{NotificationType, Role, UserStatus};
use aequora_persistence::entity::{authority, authoritycommunity, notification, user};

use crate::model::{AnnouncementRequest, NotificationInfo, NotificationList, validate};

use super::activity::{self, ActivityEntry, action};
use super::scope;

/// A notification to fan out to several recipients
#[derive(Debug, Clone)]
pub struct Notice<'a> {
    pub community_id: Option<i32>,
    pub message: String,
    pub kind: NotificationType,
    pub link: Option<&'a str>,
}

impl<'a> Notice<'a> {
    pub fn new(kind: NotificationType, message: impl Into<String>) -> Self {
        Self {
            community_id: None,
            message: message.into(),
            kind,
            link: None,
        }
    }

    pub fn community(mut self, community_id: i32) -> Self {
        self.community_id = Some(community_id);
        self
    }

    pub fn link(mut self, link: &'a str) -> Self {
        self.link = Some(link);
        self
    }
}

/// Insert one unread notification per recipient.
///
/// Runs on whatever connection it is given so callers can keep it inside
/// the transaction of the state change it describes.
pub async fn notify<C: ConnectionTrait>(
    db: &C,
    user_ids: &[i32],
    notice: &Notice<'_>,
) -> Result<u64, DbErr> {
    let mut recipients = user_ids.to_vec();
    recipients.sort_unstable();
    recipients.dedup();

    if recipients.is_empty() {
        return Ok(0);
    }

    let now = super::now();
    let rows = recipients.iter().map(|user_id| notification::ActiveModel {
        user_id: Set(*user_id),
        community_id: Set(notice.community_id),
        message: Set(notice.message.clone()),
        notification_type: Set(notice.kind),
        link: Set(notice.link.map(str::to_string)),
        is_read: Set(false),
        created_at: Set(now),
        ..Default::default()
    });

    notification::Entity::insert_many(rows).exec(db).await?;

    tracing::debug!(
        recipients = recipients.len(),
        kind = %notice.kind.to_value(),
        "Notifications queued"
    );

    Ok(recipients.len() as u64)
}

/// Active authority users serving a community
pub async fn authority_users<C: ConnectionTrait>(db: &C, community_id: i32) -> Result<Vec<i32>, DbErr> {
    let mapped: Vec<i32> = authority::Entity::find()
        .select_only()
        .column(authority::Column::UserId)
        .filter(
            authority::Column::AuthorityId.in_subquery(
                authoritycommunity::Entity::find()
                    .select_only()
                    .column(authoritycommunity::Column::AuthorityId)
                    .filter(authoritycommunity::Column::CommunityId.eq(community_id))
                    .into_query(),
            ),
        )
        .into_tuple()
        .all(db)
        .await?;

    user::Entity::find()
        .select_only()
        .column(user::Column::UserId)
        .filter(user::Column::Role.eq(Role::Authority))
        .filter(user::Column::Status.eq(UserStatus::Active))
        .filter(
            Condition::any()
                .add(user::Column::CommunityId.eq(community_id))
                .add(user::Column::UserId.is_in(mapped)),
        )
        .into_tuple()
        .all(db)
        .await
}

/// Active resident users of a community
pub async fn resident_users<C: ConnectionTrait>(db: &C, community_id: i32) -> Result<Vec<i32>, DbErr> {
    user::Entity::find()
        .select_only()
        .column(user::Column::UserId)
        .filter(user::Column::Role.eq(Role::Resident))
        .filter(user::Column::Status.eq(UserStatus::Active))
        .filter(user::Column::CommunityId.eq(community_id))
        .into_tuple()
        .all(db)
        .await
}

/// The caller's inbox, newest first
pub async fn list(db: &DatabaseConnection, principal: &Principal) -> anyhow::Result<NotificationList> {
    let (notifications, unread_count) = tokio::join!(
        notification::Entity::find()
            .filter(notification::Column::UserId.eq(principal.user_id))
            .order_by_desc(notification::Column::CreatedAt)
            .order_by_desc(notification::Column::NotificationId)
            .all(db),
        notification::Entity::find()
            .filter(notification::Column::UserId.eq(principal.user_id))
            .filter(notification::Column::IsRead.eq(false))
            .count(db)
    );

    Ok(NotificationList {
        unread_count: unread_count?,
        notifications: notifications?
            .into_iter()
            .map(NotificationInfo::from)
            .collect(),
    })
}

/// Mark every notification of the caller read, returning how many changed
pub async fn mark_all_read(db: &DatabaseConnection, principal: &Principal) -> anyhow::Result<u64> {
    let result = notification::Entity::update_many()
        .col_expr(notification::Column::IsRead, Expr::value(true))
        .filter(notification::Column::UserId.eq(principal.user_id))
        .filter(notification::Column::IsRead.eq(false))
        .exec(db)
        .await?;

    Ok(result.rows_affected)
}

/// Mark one notification read; other users' notifications are not found
pub async fn mark_read(
    db: &DatabaseConnection,
    principal: &Principal,
    notification_id: i32,
) -> anyhow::Result<NotificationInfo> {
    let found = notification::Entity::find_by_id(notification_id)
        .filter(notification::Column::UserId.eq(principal.user_id))
        .one(db)
        .await?
        .ok_or_else(|| AequoraError::ResourceNotFound(format!("notification {}", notification_id)))?;

    if found.is_read {
        return Ok(found.into());
    }

    let mut active: notification::ActiveModel = found.into();
    active.is_read = Set(true);
    let updated = active.update(db).await?;

    Ok(updated.into())
}

/// Broadcast a System notification to the residents of a served community
pub async fn announce(
    db: &DatabaseConnection,
    principal: &Principal,
    req: AnnouncementRequest,
) -> anyhow::Result<u64> {
    validate(&req)?;

    let communities = scope::require_authority_communities(db, principal).await?;
    let community_id = match req.community_id {
        Some(id) if communities.contains(&id) => id,
        Some(id) => return Err(AequoraError::ResourceNotFound(format!("community {}", id)).into()),
        None => communities[0],
    };

    let recipients = resident_users(db, community_id).await?;
    let mut notice = Notice::new(NotificationType::System, req.message.trim()).community(community_id);
    if let Some(link) = req.link.as_deref() {
        notice = notice.link(link);
    }

    let sent = notify(db, &recipients, &notice).await?;

    tracing::info!(
        authority = principal.user_id,
        community_id,
        recipients = sent,
        "Announcement broadcast"
    );
    activity::record(
        db,
        ActivityEntry::builder(principal.user_id, action::ANNOUNCE)
            .entity("community", community_id)
            .description(format!("{} recipients", sent)),
    )
    .await;

    Ok(sent)
}
