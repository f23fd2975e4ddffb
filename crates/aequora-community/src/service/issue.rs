//! Issue reporting, voting and triage

use std::collections::HashMap;

use sea_orm::{prelude::Expr, *};

use aequora_auth::Principal;
use aequora_common::{AequoraError, non_blank};
use aequora_persistence::entity::sea_orm_active_enums::{
    AssignmentStatus, IssueStatus, NotificationType, Priority, VoteType,
};
use aequora_persistence::entity::{authority, authoritycommunity, issueassignment, issuereport, issuevote, user};

use crate::model::{
    CreateIssueRequest, IssueFilter, IssueInfo, UpdateIssueRequest, VoteRequest, VoteResult,
    VoteTally, VotingResult, parse_field, parse_field_or, validate,
};

use super::activity::{self, ActivityEntry, action};
use super::notification::{self, Notice};
use super::scope;

/// Up/down counts per issue
async fn tallies<C: ConnectionTrait>(db: &C, issue_ids: &[i32]) -> anyhow::Result<HashMap<i32, VoteTally>> {
    if issue_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows: Vec<(i32, String, i64)> = issuevote::Entity::find()
        .select_only()
        .column(issuevote::Column::IssueId)
        .column(issuevote::Column::VoteType)
        .column_as(issuevote::Column::VoteId.count(), "count")
        .filter(issuevote::Column::IssueId.is_in(issue_ids.iter().copied()))
        .group_by(issuevote::Column::IssueId)
        .group_by(issuevote::Column::VoteType)
        .into_tuple()
        .all(db)
        .await?;

    let up = VoteType::Up.to_value();
    let mut result: HashMap<i32, VoteTally> = HashMap::new();
    for (issue_id, vote_type, count) in rows {
        let tally = result.entry(issue_id).or_default();
        if vote_type == up {
            tally.upvotes += count as u64;
        } else {
            tally.downvotes += count as u64;
        }
    }

    Ok(result)
}

/// Department of the current assignment per issue
async fn departments_of<C: ConnectionTrait>(db: &C, issue_ids: &[i32]) -> anyhow::Result<HashMap<i32, String>> {
    if issue_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let assignments = issueassignment::Entity::find()
        .filter(issueassignment::Column::IssueId.is_in(issue_ids.iter().copied()))
        .filter(issueassignment::Column::Status.ne(AssignmentStatus::Reassigned))
        .order_by_asc(issueassignment::Column::AssignedDate)
        .order_by_asc(issueassignment::Column::AssignmentId)
        .all(db)
        .await?;

    let departments: HashMap<i32, Option<String>> = authority::Entity::find()
        .filter(authority::Column::AuthorityId.is_in(assignments.iter().map(|a| a.authority_id)))
        .all(db)
        .await?
        .into_iter()
        .map(|a| (a.authority_id, a.department_name))
        .collect();

    // Later assignments overwrite earlier ones
    let mut result = HashMap::new();
    for assignment in assignments {
        if let Some(Some(department)) = departments.get(&assignment.authority_id) {
            result.insert(assignment.issue_id, department.clone());
        }
    }

    Ok(result)
}

/// Attach tallies, reporter names, departments and the viewer's own vote
async fn enrich<C: ConnectionTrait>(
    db: &C,
    issues: Vec<issuereport::Model>,
    viewer: Option<i32>,
) -> anyhow::Result<Vec<IssueInfo>> {
    let ids: Vec<i32> = issues.iter().map(|i| i.issue_id).collect();
    let tallies = tallies(db, &ids).await?;
    let departments = departments_of(db, &ids).await?;
    let names = scope::resident_names(db, issues.iter().map(|i| i.resident_id)).await?;

    let my_votes: HashMap<i32, VoteType> = match viewer {
        Some(resident_id) if !ids.is_empty() => issuevote::Entity::find()
            .filter(issuevote::Column::ResidentId.eq(resident_id))
            .filter(issuevote::Column::IssueId.is_in(ids.iter().copied()))
            .all(db)
            .await?
            .into_iter()
            .map(|v| (v.issue_id, v.vote_type))
            .collect(),
        _ => HashMap::new(),
    };

    Ok(issues
        .into_iter()
        .map(|issue| {
            let issue_id = issue.issue_id;
            let resident_id = issue.resident_id;
            let mut info = IssueInfo::from_model(issue, tallies.get(&issue_id).copied().unwrap_or_default());
            info.resident_name = names.get(&resident_id).cloned();
            info.assigned_department = departments.get(&issue_id).cloned();
            info.my_vote = my_votes.get(&issue_id).copied();
            info
        })
        .collect())
}

/// Report an issue in the caller's community and alert its authorities
pub async fn create(
    db: &DatabaseConnection,
    principal: &Principal,
    req: CreateIssueRequest,
) -> anyhow::Result<IssueInfo> {
    validate(&req)?;
    let community_id = scope::require_community(principal)?;
    let resident = scope::resident_of(db, principal).await?;
    let priority = parse_field_or("priority_level", req.priority_level.as_deref(), Priority::Medium)?;

    let title = req.title.trim().to_string();
    if title.is_empty() {
        return Err(AequoraError::ValidationFailed("title: must not be blank".to_string()).into());
    }

    let tx = db.begin().await?;

    let created = issuereport::ActiveModel {
        resident_id: Set(resident.resident_id),
        community_id: Set(community_id),
        title: Set(title),
        issue_type: Set(non_blank(req.issue_type)),
        description: Set(non_blank(req.description)),
        photo: Set(non_blank(req.photo)),
        map_address: Set(non_blank(req.map_address)),
        status: Set(IssueStatus::Pending),
        priority_level: Set(priority),
        created_at: Set(super::now()),
        resolved_at: Set(None),
        ..Default::default()
    }
    .insert(&tx)
    .await?;

    let link = format!("/authority/issues/{}", created.issue_id);
    let recipients = notification::authority_users(&tx, community_id).await?;
    let notice = Notice::new(
        NotificationType::Issue,
        format!(
            "New {} priority issue reported by {}: {}",
            priority.to_value(),
            principal.full_name(),
            created.title
        ),
    )
    .community(community_id)
    .link(&link);
    notification::notify(&tx, &recipients, &notice).await?;

    tx.commit().await?;

    tracing::info!(issue_id = created.issue_id, community_id, "Issue reported");
    activity::record(
        db,
        ActivityEntry::builder(principal.user_id, action::CREATE_ISSUE)
            .entity("issue", created.issue_id)
            .description(created.title.clone()),
    )
    .await;

    let mut info = IssueInfo::from_model(created, VoteTally::default());
    info.resident_name = Some(principal.full_name());
    Ok(info)
}

/// The caller's own issues, newest first
pub async fn list_own(db: &DatabaseConnection, principal: &Principal) -> anyhow::Result<Vec<IssueInfo>> {
    let resident = scope::resident_of(db, principal).await?;

    let issues = issuereport::Entity::find()
        .filter(issuereport::Column::ResidentId.eq(resident.resident_id))
        .order_by_desc(issuereport::Column::CreatedAt)
        .order_by_desc(issuereport::Column::IssueId)
        .all(db)
        .await?;

    enrich(db, issues, Some(resident.resident_id)).await
}

/// Every issue of the caller's community with tallies and the caller's vote
pub async fn list_community(db: &DatabaseConnection, principal: &Principal) -> anyhow::Result<Vec<IssueInfo>> {
    let community_id = scope::require_community(principal)?;
    let resident = scope::resident_of(db, principal).await?;

    let issues = issuereport::Entity::find()
        .filter(issuereport::Column::CommunityId.eq(community_id))
        .order_by_desc(issuereport::Column::CreatedAt)
        .order_by_desc(issuereport::Column::IssueId)
        .all(db)
        .await?;

    enrich(db, issues, Some(resident.resident_id)).await
}

/// Toggle the caller's vote on a community issue.
///
/// No vote creates one, the same type removes it, the other type switches.
pub async fn vote(db: &DatabaseConnection, principal: &Principal, req: VoteRequest) -> anyhow::Result<VoteResult> {
    let vote_type: VoteType = parse_field("type", &req.vote_type)?;
    let community_id = scope::require_community(principal)?;
    let resident = scope::resident_of(db, principal).await?;

    let issue = issuereport::Entity::find_by_id(req.issue_id)
        .filter(issuereport::Column::CommunityId.eq(community_id))
        .one(db)
        .await?
        .ok_or_else(|| AequoraError::ResourceNotFound(format!("issue {}", req.issue_id)))?;

    if issue.status.is_closed() {
        return Err(AequoraError::IllegalState(format!(
            "issue {} is {} and no longer accepts votes",
            issue.issue_id,
            issue.status.to_value()
        ))
        .into());
    }

    let existing = issuevote::Entity::find()
        .filter(issuevote::Column::IssueId.eq(issue.issue_id))
        .filter(issuevote::Column::ResidentId.eq(resident.resident_id))
        .one(db)
        .await?;

    let my_vote = match existing {
        None => {
            issuevote::ActiveModel {
                issue_id: Set(issue.issue_id),
                resident_id: Set(resident.resident_id),
                vote_type: Set(vote_type),
                voted_at: Set(super::now()),
                ..Default::default()
            }
            .insert(db)
            .await?;
            Some(vote_type)
        }
        Some(found) if found.vote_type == vote_type => {
            issuevote::Entity::delete_by_id(found.vote_id).exec(db).await?;
            None
        }
        Some(found) => {
            let mut active: issuevote::ActiveModel = found.into();
            active.vote_type = Set(vote_type);
            active.voted_at = Set(super::now());
            active.update(db).await?;
            Some(vote_type)
        }
    };

    activity::record(
        db,
        ActivityEntry::builder(principal.user_id, action::VOTE_ISSUE)
            .entity("issue", issue.issue_id)
            .description(my_vote.map(|v| v.to_value()).unwrap_or_else(|| "withdrawn".to_string())),
    )
    .await;

    let tally = tallies(db, &[issue.issue_id])
        .await?
        .remove(&issue.issue_id)
        .unwrap_or_default();

    Ok(VoteResult {
        issue_id: issue.issue_id,
        upvotes: tally.upvotes,
        downvotes: tally.downvotes,
        my_vote,
    })
}

/// Issues of the caller's communities, optionally filtered
pub async fn list_for_authority(
    db: &DatabaseConnection,
    principal: &Principal,
    filter: &IssueFilter,
) -> anyhow::Result<Vec<IssueInfo>> {
    let communities = scope::authority_communities(db, principal).await?;
    if communities.is_empty() {
        return Ok(Vec::new());
    }

    let mut query = issuereport::Entity::find().filter(issuereport::Column::CommunityId.is_in(communities));
    if let Some(status) = filter.status.as_deref().filter(|v| !v.trim().is_empty()) {
        query = query.filter(issuereport::Column::Status.eq(parse_field::<IssueStatus>("status", status)?));
    }
    if let Some(priority) = filter.priority.as_deref().filter(|v| !v.trim().is_empty()) {
        query = query.filter(issuereport::Column::PriorityLevel.eq(parse_field::<Priority>("priority", priority)?));
    }

    let issues = query
        .order_by_desc(issuereport::Column::CreatedAt)
        .order_by_desc(issuereport::Column::IssueId)
        .all(db)
        .await?;

    enrich(db, issues, None).await
}

async fn find_for_authority<C: ConnectionTrait>(
    db: &C,
    principal: &Principal,
    issue_id: i32,
) -> anyhow::Result<issuereport::Model> {
    let communities = scope::authority_communities(db, principal).await?;

    issuereport::Entity::find_by_id(issue_id)
        .filter(issuereport::Column::CommunityId.is_in(communities))
        .one(db)
        .await?
        .ok_or_else(|| AequoraError::ResourceNotFound(format!("issue {}", issue_id)).into())
}

pub async fn get_for_authority(
    db: &DatabaseConnection,
    principal: &Principal,
    issue_id: i32,
) -> anyhow::Result<IssueInfo> {
    let issue = find_for_authority(db, principal, issue_id).await?;
    let mut infos = enrich(db, vec![issue], None).await?;

    infos
        .pop()
        .ok_or_else(|| AequoraError::ResourceNotFound(format!("issue {}", issue_id)).into())
}

/// An authority of `department` serving `community_id`
async fn department_authority<C: ConnectionTrait>(
    db: &C,
    department: &str,
    community_id: i32,
) -> anyhow::Result<authority::Model> {
    authority::Entity::find()
        .filter(authority::Column::DepartmentName.eq(department))
        .filter(
            Condition::any()
                .add(
                    authority::Column::AuthorityId.in_subquery(
                        authoritycommunity::Entity::find()
                            .select_only()
                            .column(authoritycommunity::Column::AuthorityId)
                            .filter(authoritycommunity::Column::CommunityId.eq(community_id))
                            .into_query(),
                    ),
                )
                .add(
                    authority::Column::UserId.in_subquery(
                        user::Entity::find()
                            .select_only()
                            .column(user::Column::UserId)
                            .filter(user::Column::CommunityId.eq(community_id))
                            .into_query(),
                    ),
                ),
        )
        .order_by_asc(authority::Column::AuthorityId)
        .one(db)
        .await?
        .ok_or_else(|| {
            AequoraError::ResourceNotFound(format!(
                "authority of department '{}' in community {}",
                department, community_id
            ))
            .into()
        })
}

/// Triage an issue: status, priority and department assignment
pub async fn update(
    db: &DatabaseConnection,
    principal: &Principal,
    issue_id: i32,
    req: UpdateIssueRequest,
) -> anyhow::Result<IssueInfo> {
    let issue = find_for_authority(db, principal, issue_id).await?;

    let requested_status = match req.status.as_deref().filter(|v| !v.trim().is_empty()) {
        Some(v) => Some(parse_field::<IssueStatus>("status", v)?),
        None => None,
    };
    let priority = match req.priority_level.as_deref().filter(|v| !v.trim().is_empty()) {
        Some(v) => Some(parse_field::<Priority>("priority_level", v)?),
        None => None,
    };
    let department = non_blank(req.assigned_to);
    let remarks = non_blank(req.remarks);

    let assignee = match &department {
        Some(department) => {
            if issue.status.is_closed() {
                return Err(AequoraError::IllegalState(format!(
                    "issue {} is {} and cannot be assigned",
                    issue_id,
                    issue.status.to_value()
                ))
                .into());
            }
            Some(department_authority(db, department, issue.community_id).await?)
        }
        None => None,
    };

    if requested_status.is_some() && issue.status.is_closed() {
        return Err(AequoraError::IllegalState(format!(
            "issue {} is already {}",
            issue_id,
            issue.status.to_value()
        ))
        .into());
    }

    // An assignment moves a fresh issue into progress unless a status is given
    let target_status = match requested_status {
        Some(status) => Some(status),
        None if assignee.is_some() && issue.status == IssueStatus::Pending => Some(IssueStatus::InProgress),
        None => None,
    }
    .filter(|status| *status != issue.status);

    if let Some(next) = target_status
        && !issue.status.can_transition_to(next)
    {
        return Err(AequoraError::IllegalState(format!(
            "issue {} cannot move from {} to {}",
            issue_id,
            issue.status.to_value(),
            next.to_value()
        ))
        .into());
    }

    let resident_user = scope::user_of_resident(db, issue.resident_id).await?;
    let title = issue.title.clone();
    let community_id = issue.community_id;
    let now = super::now();

    let tx = db.begin().await?;

    let original = issue.clone();
    let mut active: issuereport::ActiveModel = issue.into();
    if let Some(priority) = priority {
        active.priority_level = Set(priority);
    }
    if let Some(next) = target_status {
        active.status = Set(next);
        if next == IssueStatus::Resolved {
            active.resolved_at = Set(Some(now));
        }
    }
    let updated = if active.is_changed() {
        active.update(&tx).await?
    } else {
        original
    };

    let mut messages = Vec::new();

    if let Some(assignee) = &assignee {
        issueassignment::Entity::update_many()
            .col_expr(issueassignment::Column::Status, Expr::value(AssignmentStatus::Reassigned))
            .filter(issueassignment::Column::IssueId.eq(issue_id))
            .filter(issueassignment::Column::Status.eq(AssignmentStatus::Assigned))
            .exec(&tx)
            .await?;

        issueassignment::ActiveModel {
            issue_id: Set(issue_id),
            authority_id: Set(assignee.authority_id),
            provider_id: Set(None),
            assigned_date: Set(now),
            remarks: Set(remarks.clone()),
            status: Set(AssignmentStatus::Assigned),
            ..Default::default()
        }
        .insert(&tx)
        .await?;

        messages.push(format!(
            "Your issue '{}' was assigned to the {} department",
            title,
            department.as_deref().unwrap_or_default()
        ));

        if assignee.user_id != principal.user_id {
            let notice = Notice::new(
                NotificationType::Issue,
                format!("Issue '{}' was assigned to your department", title),
            )
            .community(community_id);
            notification::notify(&tx, &[assignee.user_id], &notice).await?;
        }
    }

    if let Some(next) = target_status {
        if next.is_closed() {
            issueassignment::Entity::update_many()
                .col_expr(issueassignment::Column::Status, Expr::value(AssignmentStatus::Completed))
                .filter(issueassignment::Column::IssueId.eq(issue_id))
                .filter(issueassignment::Column::Status.eq(AssignmentStatus::Assigned))
                .exec(&tx)
                .await?;
        }

        let mut message = format!("Your issue '{}' is now {}", title, next.to_value());
        if let Some(remarks) = &remarks {
            message.push_str(&format!(": {}", remarks));
        }
        messages.push(message);
    }

    if let Some(resident_user) = resident_user {
        let link = format!("/resident/issues/{}", issue_id);
        for message in messages {
            let notice = Notice::new(NotificationType::Issue, message)
                .community(community_id)
                .link(&link);
            notification::notify(&tx, &[resident_user], &notice).await?;
        }
    }

    tx.commit().await?;

    tracing::info!(
        issue_id,
        status = %updated.status.to_value(),
        assigned = department.is_some(),
        "Issue updated"
    );
    activity::record(
        db,
        ActivityEntry::builder(principal.user_id, action::UPDATE_ISSUE)
            .entity("issue", issue_id)
            .description(format!("status {}", updated.status.to_value())),
    )
    .await;

    let mut infos = enrich(db, vec![updated], None).await?;
    infos
        .pop()
        .ok_or_else(|| AequoraError::ResourceNotFound(format!("issue {}", issue_id)).into())
}

/// Distinct departments of authorities serving the caller's communities
pub async fn departments(db: &DatabaseConnection, principal: &Principal) -> anyhow::Result<Vec<String>> {
    let communities = scope::authority_communities(db, principal).await?;
    if communities.is_empty() {
        return Ok(Vec::new());
    }

    let mut departments: Vec<String> = authority::Entity::find()
        .select_only()
        .column(authority::Column::DepartmentName)
        .filter(authority::Column::DepartmentName.is_not_null())
        .filter(
            Condition::any()
                .add(
                    authority::Column::AuthorityId.in_subquery(
                        authoritycommunity::Entity::find()
                            .select_only()
                            .column(authoritycommunity::Column::AuthorityId)
                            .filter(authoritycommunity::Column::CommunityId.is_in(communities.clone()))
                            .into_query(),
                    ),
                )
                .add(
                    authority::Column::UserId.in_subquery(
                        user::Entity::find()
                            .select_only()
                            .column(user::Column::UserId)
                            .filter(user::Column::CommunityId.is_in(communities))
                            .into_query(),
                    ),
                ),
        )
        .distinct()
        .into_tuple::<Option<String>>()
        .all(db)
        .await?
        .into_iter()
        .flatten()
        .filter(|d| !d.trim().is_empty())
        .collect();

    departments.sort();
    departments.dedup();

    Ok(departments)
}

/// Issues ranked by vote score, then newest first
pub async fn voting_results(db: &DatabaseConnection, principal: &Principal) -> anyhow::Result<Vec<VotingResult>> {
    let communities = scope::authority_communities(db, principal).await?;
    if communities.is_empty() {
        return Ok(Vec::new());
    }

    let issues = issuereport::Entity::find()
        .filter(issuereport::Column::CommunityId.is_in(communities))
        .all(db)
        .await?;
    let ids: Vec<i32> = issues.iter().map(|i| i.issue_id).collect();
    let tallies = tallies(db, &ids).await?;

    let mut results: Vec<VotingResult> = issues
        .into_iter()
        .map(|issue| {
            let tally = tallies.get(&issue.issue_id).copied().unwrap_or_default();
            VotingResult {
                issue_id: issue.issue_id,
                title: issue.title,
                status: issue.status,
                upvotes: tally.upvotes,
                downvotes: tally.downvotes,
                score: tally.score(),
                created_at: issue.created_at,
            }
        })
        .collect();

    results.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| b.created_at.cmp(&a.created_at))
            .then_with(|| b.issue_id.cmp(&a.issue_id))
    });

    Ok(results)
}
