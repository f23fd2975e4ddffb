//! Payments
//!
//! The gateway is a seam: a sandbox that settles locally and an HTTP client
//! for a real provider. Gateway calls never run inside a database
//! transaction; the booking is claimed first with a conditional update so
//! two concurrent attempts cannot both charge.

use std::time::Duration;

use async_trait::async_trait;
use sea_orm::{prelude::Expr, *};
use serde::{Deserialize, Serialize};

use aequora_auth::Principal;
use aequora_common::{AequoraError, round_money};
use aequora_persistence::entity::sea_orm_active_enums::{
    BookingStatus, NotificationType, PaymentMethod, PaymentStatus,
};
use aequora_persistence::entity::{booking, payment};

use crate::model::{PayRequest, PaymentInfo, parse_field};

use super::activity::{self, ActivityEntry, action};
use super::notification::{self, Notice};
use super::scope;

/// A charge against a booking
#[derive(Debug, Clone, Serialize)]
pub struct ChargeRequest {
    pub booking_id: i32,
    pub amount: f64,
    pub method: PaymentMethod,
    /// Idempotency reference sent to the provider
    pub reference: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChargeStatus {
    Approved,
    /// Settled later, e.g. cash on completion
    Pending,
    Declined,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargeOutcome {
    pub status: ChargeStatus,
    pub transaction_id: Option<String>,
    pub message: Option<String>,
}

impl ChargeOutcome {
    pub fn pending() -> Self {
        Self {
            status: ChargeStatus::Pending,
            transaction_id: None,
            message: None,
        }
    }
}

/// External payment provider
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Charge the resident. Transport failures are errors; a refused
    /// charge is a `Declined` outcome.
    async fn charge(&self, request: ChargeRequest) -> anyhow::Result<ChargeOutcome>;

    async fn refund(&self, transaction_id: &str, amount: f64) -> anyhow::Result<()>;

    fn name(&self) -> &'static str;
}

/// Settles electronic payments locally with generated transaction ids
#[derive(Debug, Clone, Default)]
pub struct SandboxGateway;

#[async_trait]
impl PaymentGateway for SandboxGateway {
    async fn charge(&self, request: ChargeRequest) -> anyhow::Result<ChargeOutcome> {
        if request.method == PaymentMethod::Cash {
            return Ok(ChargeOutcome::pending());
        }

        if !(request.amount.is_finite() && request.amount >= 0.0) {
            return Ok(ChargeOutcome {
                status: ChargeStatus::Declined,
                transaction_id: None,
                message: Some(format!("invalid amount {}", request.amount)),
            });
        }

        Ok(ChargeOutcome {
            status: ChargeStatus::Approved,
            transaction_id: Some(format!("SBX-{}", uuid::Uuid::new_v4().simple())),
            message: None,
        })
    }

    async fn refund(&self, transaction_id: &str, amount: f64) -> anyhow::Result<()> {
        tracing::debug!(transaction_id, amount, "Sandbox refund");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "sandbox"
    }
}

/// HTTP gateway settings
#[derive(Debug, Clone)]
pub struct HttpGatewayConfig {
    pub url: String,
    pub api_key: String,
    pub timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct GatewayResponse {
    status: String,
    #[serde(default)]
    transaction_id: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl GatewayResponse {
    fn into_outcome(self) -> ChargeOutcome {
        let status = match self.status.to_ascii_lowercase().as_str() {
            "approved" | "success" | "succeeded" | "paid" => ChargeStatus::Approved,
            "pending" | "processing" => ChargeStatus::Pending,
            _ => ChargeStatus::Declined,
        };

        ChargeOutcome {
            status,
            transaction_id: self.transaction_id,
            message: self.message,
        }
    }
}

/// JSON-over-HTTP payment provider client
pub struct HttpGateway {
    config: HttpGatewayConfig,
    http_client: reqwest::Client,
}

impl HttpGateway {
    pub fn new(config: HttpGatewayConfig) -> anyhow::Result<Self> {
        if config.url.trim().is_empty() {
            return Err(AequoraError::ConfigError("payment gateway url is not configured".to_string()).into());
        }

        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AequoraError::ConfigError(format!("failed to build payment client: {}", e)))?;

        Ok(Self { config, http_client })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl PaymentGateway for HttpGateway {
    async fn charge(&self, request: ChargeRequest) -> anyhow::Result<ChargeOutcome> {
        let response = self
            .http_client
            .post(self.endpoint("charges"))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json::<GatewayResponse>()
            .await?;

        Ok(response.into_outcome())
    }

    async fn refund(&self, transaction_id: &str, amount: f64) -> anyhow::Result<()> {
        self.http_client
            .post(self.endpoint("refunds"))
            .bearer_auth(&self.config.api_key)
            .json(&serde_json::json!({
                "transaction_id": transaction_id,
                "amount": amount,
            }))
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// Insert or update the single payment row of a booking and mirror its
/// status onto the booking
async fn settle<C: ConnectionTrait>(
    db: &C,
    booking_id: i32,
    amount: f64,
    method: PaymentMethod,
    status: PaymentStatus,
    transaction_id: Option<String>,
) -> anyhow::Result<payment::Model> {
    let paid_at = (status == PaymentStatus::Paid).then(super::now);

    let existing = payment::Entity::find()
        .filter(payment::Column::BookingId.eq(booking_id))
        .one(db)
        .await?;

    let saved = match existing {
        Some(found) => {
            let mut active: payment::ActiveModel = found.into();
            active.amount = Set(amount);
            active.method = Set(method);
            active.transaction_id = Set(transaction_id);
            active.payment_date = Set(paid_at);
            active.status = Set(status);
            active.update(db).await?
        }
        None => {
            payment::ActiveModel {
                booking_id: Set(booking_id),
                amount: Set(amount),
                method: Set(method),
                transaction_id: Set(transaction_id),
                payment_date: Set(paid_at),
                status: Set(status),
                ..Default::default()
            }
            .insert(db)
            .await?
        }
    };

    booking::Entity::update_many()
        .col_expr(booking::Column::PaymentStatus, Expr::value(status))
        .filter(booking::Column::BookingId.eq(booking_id))
        .exec(db)
        .await?;

    Ok(saved)
}

/// Pay for one of the caller's bookings
pub async fn pay(
    db: &DatabaseConnection,
    gateway: &dyn PaymentGateway,
    principal: &Principal,
    booking_id: i32,
    req: PayRequest,
) -> anyhow::Result<PaymentInfo> {
    let method: PaymentMethod = parse_field("method", &req.method)?;
    let resident = scope::resident_of(db, principal).await?;

    let found = booking::Entity::find_by_id(booking_id)
        .filter(booking::Column::ResidentId.eq(resident.resident_id))
        .one(db)
        .await?
        .ok_or_else(|| AequoraError::ResourceNotFound(format!("booking {}", booking_id)))?;

    if found.status.releases_availability() {
        return Err(AequoraError::IllegalState(format!(
            "booking {} is {} and cannot be paid",
            booking_id,
            found.status.to_value()
        ))
        .into());
    }
    if !found.payment_status.accepts_payment() {
        return Err(AequoraError::IllegalState(format!(
            "booking {} payment is already {}",
            booking_id,
            found.payment_status.to_value()
        ))
        .into());
    }

    // Claim the booking so a concurrent attempt sees it as in flight
    let claimed = booking::Entity::update_many()
        .col_expr(booking::Column::PaymentStatus, Expr::value(PaymentStatus::Pending))
        .filter(booking::Column::BookingId.eq(booking_id))
        .filter(booking::Column::PaymentStatus.is_in([PaymentStatus::Unpaid, PaymentStatus::Failed]))
        .filter(booking::Column::Status.is_not_in([BookingStatus::Rejected, BookingStatus::Cancelled]))
        .exec(db)
        .await?;
    if claimed.rows_affected == 0 {
        return Err(AequoraError::IllegalState(format!(
            "booking {} is already being paid",
            booking_id
        ))
        .into());
    }

    let amount = round_money(found.price);
    let outcome = if method == PaymentMethod::Cash {
        Ok(ChargeOutcome::pending())
    } else {
        gateway
            .charge(ChargeRequest {
                booking_id,
                amount,
                method,
                reference: format!("AEQ-{}-{}", booking_id, uuid::Uuid::new_v4().simple()),
            })
            .await
    };

    let outcome = match outcome {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!(
                error = %e,
                booking_id,
                gateway = gateway.name(),
                "Payment gateway call failed"
            );
            settle(db, booking_id, amount, method, PaymentStatus::Failed, None).await?;
            return Err(AequoraError::PaymentError(format!("payment gateway unavailable: {}", e)).into());
        }
    };

    let status = match outcome.status {
        ChargeStatus::Approved => PaymentStatus::Paid,
        ChargeStatus::Pending => PaymentStatus::Pending,
        ChargeStatus::Declined => PaymentStatus::Failed,
    };

    let recorded = async {
        let tx = db.begin().await?;

        let saved = settle(&tx, booking_id, amount, method, status, outcome.transaction_id.clone()).await?;

        if status != PaymentStatus::Failed
            && let Some(provider_user) = scope::user_of_provider(&tx, found.provider_id).await?
        {
            let message = match status {
                PaymentStatus::Paid => {
                    format!("Booking #{} was paid ({:.2} via {})", booking_id, amount, method.to_value())
                }
                _ => format!("Booking #{} will be paid in cash ({:.2})", booking_id, amount),
            };
            let notice = Notice::new(NotificationType::Payment, message).community(found.community_id);
            notification::notify(&tx, &[provider_user], &notice).await?;
        }

        tx.commit().await?;
        Ok::<_, anyhow::Error>(saved)
    }
    .await;

    // The gateway already answered; its outcome must outlive a failed transaction
    let saved = match recorded {
        Ok(saved) => saved,
        Err(e) => {
            tracing::error!(
                error = %e,
                booking_id,
                transaction_id = outcome.transaction_id.as_deref().unwrap_or_default(),
                status = %status.to_value(),
                "Failed to record payment, retrying without notification"
            );
            settle(db, booking_id, amount, method, status, outcome.transaction_id.clone())
                .await
                .inspect_err(|e| {
                    tracing::error!(
                        error = %e,
                        booking_id,
                        transaction_id = outcome.transaction_id.as_deref().unwrap_or_default(),
                        "Payment outcome could not be recorded"
                    )
                })?
        }
    };

    tracing::info!(
        booking_id,
        payment_id = saved.payment_id,
        status = %status.to_value(),
        method = %method.to_value(),
        gateway = gateway.name(),
        "Payment processed"
    );

    if status == PaymentStatus::Failed {
        return Err(AequoraError::PaymentError(
            outcome
                .message
                .unwrap_or_else(|| "payment was declined".to_string()),
        )
        .into());
    }

    activity::record(
        db,
        ActivityEntry::builder(principal.user_id, action::PAYMENT)
            .entity("booking", booking_id)
            .description(format!("{} {:.2} {}", method.to_value(), amount, status.to_value())),
    )
    .await;

    Ok(saved.into())
}

/// The caller's payments, newest first
pub async fn list_payments(db: &DatabaseConnection, principal: &Principal) -> anyhow::Result<Vec<PaymentInfo>> {
    let resident = scope::resident_of(db, principal).await?;

    let payments = payment::Entity::find()
        .filter(
            payment::Column::BookingId.in_subquery(
                booking::Entity::find()
                    .select_only()
                    .column(booking::Column::BookingId)
                    .filter(booking::Column::ResidentId.eq(resident.resident_id))
                    .into_query(),
            ),
        )
        .order_by_desc(payment::Column::PaymentId)
        .all(db)
        .await?;

    Ok(payments.into_iter().map(PaymentInfo::from).collect())
}

/// The settled payment of a booking, if any
pub(crate) async fn settled_payment<C: ConnectionTrait>(db: &C, booking_id: i32) -> anyhow::Result<Option<payment::Model>> {
    Ok(payment::Entity::find()
        .filter(payment::Column::BookingId.eq(booking_id))
        .filter(payment::Column::Status.eq(PaymentStatus::Paid))
        .one(db)
        .await?)
}

/// Return a settled payment through the gateway. Cash is handed back in
/// person and needs no call.
pub(crate) async fn refund(gateway: &dyn PaymentGateway, paid: &payment::Model) -> anyhow::Result<()> {
    if paid.method == PaymentMethod::Cash {
        return Ok(());
    }

    let transaction_id = paid.transaction_id.as_deref().unwrap_or_default();
    gateway.refund(transaction_id, paid.amount).await.map_err(|e| {
        tracing::error!(error = %e, booking_id = paid.booking_id, gateway = gateway.name(), "Payment refund failed");
        AequoraError::PaymentError(format!("refund failed: {}", e))
    })?;

    tracing::info!(booking_id = paid.booking_id, transaction_id, amount = paid.amount, "Payment refunded");
    Ok(())
}

/// Mark a refunded payment and its booking
pub(crate) async fn mark_refunded<C: ConnectionTrait>(db: &C, refunded: payment::Model) -> anyhow::Result<()> {
    let booking_id = refunded.booking_id;

    let mut active: payment::ActiveModel = refunded.into();
    active.status = Set(PaymentStatus::Refunded);
    active.update(db).await?;

    booking::Entity::update_many()
        .col_expr(booking::Column::PaymentStatus, Expr::value(PaymentStatus::Refunded))
        .filter(booking::Column::BookingId.eq(booking_id))
        .exec(db)
        .await?;

    Ok(())
}

/// Collect a pending cash payment when the job is completed
pub(crate) async fn collect_cash<C: ConnectionTrait>(db: &C, booking_id: i32) -> anyhow::Result<bool> {
    let Some(found) = payment::Entity::find()
        .filter(payment::Column::BookingId.eq(booking_id))
        .filter(payment::Column::Method.eq(PaymentMethod::Cash))
        .filter(payment::Column::Status.eq(PaymentStatus::Pending))
        .one(db)
        .await?
    else {
        return Ok(false);
    };

    settle(db, booking_id, found.amount, PaymentMethod::Cash, PaymentStatus::Paid, found.transaction_id).await?;

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn charge(method: PaymentMethod, amount: f64) -> ChargeRequest {
        ChargeRequest {
            booking_id: 1,
            amount,
            method,
            reference: "AEQ-1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_sandbox_approves_electronic_methods() {
        let outcome = SandboxGateway.charge(charge(PaymentMethod::BKash, 250.0)).await.unwrap();
        assert_eq!(outcome.status, ChargeStatus::Approved);
        assert!(outcome.transaction_id.unwrap().starts_with("SBX-"));
    }

    #[tokio::test]
    async fn test_sandbox_leaves_cash_pending() {
        let outcome = SandboxGateway.charge(charge(PaymentMethod::Cash, 250.0)).await.unwrap();
        assert_eq!(outcome, ChargeOutcome::pending());
    }

    #[tokio::test]
    async fn test_sandbox_declines_invalid_amount() {
        let outcome = SandboxGateway.charge(charge(PaymentMethod::Card, f64::NAN)).await.unwrap();
        assert_eq!(outcome.status, ChargeStatus::Declined);
    }

    #[test]
    fn test_gateway_response_mapping() {
        let approved: GatewayResponse =
            serde_json::from_str(r#"{"status":"SUCCESS","transaction_id":"T1"}"#).unwrap();
        let outcome = approved.into_outcome();
        assert_eq!(outcome.status, ChargeStatus::Approved);
        assert_eq!(outcome.transaction_id.as_deref(), Some("T1"));

        let declined: GatewayResponse =
            serde_json::from_str(r#"{"status":"insufficient_funds","message":"no funds"}"#).unwrap();
        assert_eq!(declined.into_outcome().status, ChargeStatus::Declined);
    }

    #[test]
    fn test_http_gateway_requires_url() {
        let config = HttpGatewayConfig {
            url: " ".to_string(),
            api_key: "key".to_string(),
            timeout: Duration::from_secs(1),
        };
        assert!(HttpGateway::new(config).is_err());
    }
}
