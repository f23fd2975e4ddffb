//! Booking, payment and review workflows against SQLite

mod common;

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use sea_orm::{ConnectionTrait, DatabaseConnection, EntityTrait};

use aequora_auth::Principal;
use aequora_common::AequoraError;
use aequora_community::service::{booking, catalog, dashboard, notification, payment, review};
use aequora_community::{
    BookingFilter, BookingPolicy, BookingStatusRequest, ChargeOutcome, ChargeRequest, ChargeStatus, CreateBookingRequest,
    CreateServiceRequest, PayRequest, PaymentGateway, ReviewRequest, SandboxGateway, UpdateServiceRequest,
};
use aequora_persistence::entity::sea_orm_active_enums::{BookingStatus, PaymentStatus};
use aequora_persistence::entity::{booking as booking_entity, service};

use common::{actions_of, domain_error, tomorrow};

/// Gateway that is always unreachable
struct DownGateway;

#[async_trait]
impl PaymentGateway for DownGateway {
    async fn charge(&self, _request: ChargeRequest) -> anyhow::Result<ChargeOutcome> {
        anyhow::bail!("connection refused")
    }

    async fn refund(&self, _transaction_id: &str, _amount: f64) -> anyhow::Result<()> {
        anyhow::bail!("connection refused")
    }

    fn name(&self) -> &'static str {
        "down"
    }
}

/// Gateway that approves charges and records what the database looked like
/// when each refund arrived
struct RecordingGateway {
    db: DatabaseConnection,
    booking_id: i32,
    refunds: AtomicUsize,
    status_at_refund: Mutex<Option<BookingStatus>>,
}

impl RecordingGateway {
    fn new(db: &DatabaseConnection, booking_id: i32) -> Self {
        Self {
            db: db.clone(),
            booking_id,
            refunds: AtomicUsize::new(0),
            status_at_refund: Mutex::new(None),
        }
    }
}

#[async_trait]
impl PaymentGateway for RecordingGateway {
    async fn charge(&self, request: ChargeRequest) -> anyhow::Result<ChargeOutcome> {
        SandboxGateway.charge(request).await
    }

    async fn refund(&self, _transaction_id: &str, _amount: f64) -> anyhow::Result<()> {
        self.refunds.fetch_add(1, Ordering::SeqCst);
        let seen = booking_entity::Entity::find_by_id(self.booking_id)
            .one(&self.db)
            .await?
            .map(|b| b.status);
        *self.status_at_refund.lock().unwrap() = seen;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

/// Gateway that approves the charge but breaks the bookkeeping that follows
struct BreakingGateway {
    db: DatabaseConnection,
}

#[async_trait]
impl PaymentGateway for BreakingGateway {
    async fn charge(&self, _request: ChargeRequest) -> anyhow::Result<ChargeOutcome> {
        self.db.execute_unprepared("DROP TABLE notification").await?;
        Ok(ChargeOutcome {
            status: ChargeStatus::Approved,
            transaction_id: Some("TX-BROKEN-1".to_string()),
            message: None,
        })
    }

    async fn refund(&self, _transaction_id: &str, _amount: f64) -> anyhow::Result<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "breaking"
    }
}

struct Fixture {
    db: DatabaseConnection,
    resident: Principal,
    provider: Principal,
    service_id: i32,
}

fn no_window() -> BookingPolicy {
    BookingPolicy {
        duplicate_window: Duration::ZERO,
    }
}

async fn fixture(availability: i32) -> Fixture {
    let db = common::setup_db().await;
    let community_id = common::seed_community(&db, "Banani").await;
    let resident = common::resident(&db, "resident@aequora.test", community_id).await;
    let provider = common::provider(&db, "provider@aequora.test", community_id).await;

    let created = catalog::create(
        &db,
        &provider,
        CreateServiceRequest {
            service_name: "Plumbing".to_string(),
            category: "Repair".to_string(),
            price: 500.0,
            availability: Some(availability),
            description: None,
            is_active: None,
        },
    )
    .await
    .unwrap();

    Fixture {
        db,
        resident,
        provider,
        service_id: created.service_id,
    }
}

async fn availability(db: &DatabaseConnection, service_id: i32) -> i32 {
    service::Entity::find_by_id(service_id)
        .one(db)
        .await
        .unwrap()
        .unwrap()
        .availability
}

fn book(service_id: i32, days_ahead: i64) -> CreateBookingRequest {
    CreateBookingRequest {
        service_id,
        service_date: tomorrow() + chrono::Duration::days(days_ahead),
    }
}

fn status(value: &str) -> BookingStatusRequest {
    BookingStatusRequest {
        status: value.to_string(),
    }
}

#[tokio::test]
async fn test_booking_takes_one_unit() {
    let f = fixture(2).await;

    let created = booking::create(&f.db, &no_window(), &f.resident, book(f.service_id, 0))
        .await
        .unwrap();

    assert_eq!(created.status, BookingStatus::Pending);
    assert_eq!(created.payment_status, PaymentStatus::Unpaid);
    assert_eq!(created.price, 500.0);
    assert_eq!(created.service_name.as_deref(), Some("Plumbing"));
    assert_eq!(availability(&f.db, f.service_id).await, 1);

    // The provider hears about it
    let inbox = notification::list(&f.db, &f.provider).await.unwrap();
    assert_eq!(inbox.unread_count, 1);
}

#[tokio::test]
async fn test_sold_out_service_is_refused() {
    let f = fixture(1).await;

    booking::create(&f.db, &no_window(), &f.resident, book(f.service_id, 0))
        .await
        .unwrap();
    let err = booking::create(&f.db, &no_window(), &f.resident, book(f.service_id, 1))
        .await
        .unwrap_err();

    assert!(matches!(domain_error(&err), AequoraError::ServiceUnavailable(_)));
    assert_eq!(availability(&f.db, f.service_id).await, 0);
}

#[tokio::test]
async fn test_duplicate_booking_rolls_back_the_unit() {
    let f = fixture(5).await;

    booking::create(&f.db, &no_window(), &f.resident, book(f.service_id, 0))
        .await
        .unwrap();
    let err = booking::create(&f.db, &no_window(), &f.resident, book(f.service_id, 0))
        .await
        .unwrap_err();

    assert!(matches!(domain_error(&err), AequoraError::DuplicateBooking(_)));
    assert_eq!(availability(&f.db, f.service_id).await, 4);
}

#[tokio::test]
async fn test_rapid_rebooking_inside_window_is_refused() {
    let f = fixture(5).await;
    let policy = BookingPolicy::default();

    booking::create(&f.db, &policy, &f.resident, book(f.service_id, 0))
        .await
        .unwrap();
    let err = booking::create(&f.db, &policy, &f.resident, book(f.service_id, 3))
        .await
        .unwrap_err();

    assert!(matches!(domain_error(&err), AequoraError::DuplicateBooking(_)));
    assert_eq!(availability(&f.db, f.service_id).await, 4);
}

#[tokio::test]
async fn test_past_service_date_is_refused() {
    let f = fixture(1).await;

    let err = booking::create(&f.db, &no_window(), &f.resident, book(f.service_id, -3))
        .await
        .unwrap_err();

    assert!(matches!(domain_error(&err), AequoraError::ValidationFailed(_)));
    assert_eq!(availability(&f.db, f.service_id).await, 1);
}

#[tokio::test]
async fn test_cancel_restores_availability() {
    let f = fixture(1).await;

    let created = booking::create(&f.db, &no_window(), &f.resident, book(f.service_id, 0))
        .await
        .unwrap();
    let cancelled = booking::cancel(&f.db, &SandboxGateway, &f.resident, created.booking_id)
        .await
        .unwrap();

    assert_eq!(cancelled.status, BookingStatus::Cancelled);
    assert_eq!(availability(&f.db, f.service_id).await, 1);

    // Terminal bookings cannot be cancelled twice
    let err = booking::cancel(&f.db, &SandboxGateway, &f.resident, created.booking_id)
        .await
        .unwrap_err();
    assert!(matches!(domain_error(&err), AequoraError::IllegalState(_)));
    assert_eq!(availability(&f.db, f.service_id).await, 1);
}

#[tokio::test]
async fn test_provider_transitions() {
    let f = fixture(3).await;

    let first = booking::create(&f.db, &no_window(), &f.resident, book(f.service_id, 0))
        .await
        .unwrap();
    let second = booking::create(&f.db, &no_window(), &f.resident, book(f.service_id, 1))
        .await
        .unwrap();

    let rejected = booking::update_status(&f.db, &SandboxGateway, &f.provider, second.booking_id, status("Rejected"))
        .await
        .unwrap();
    assert_eq!(rejected.status, BookingStatus::Rejected);
    assert_eq!(availability(&f.db, f.service_id).await, 2);

    // Withdrawing a pending request is the resident's call
    let err = booking::update_status(&f.db, &SandboxGateway, &f.provider, first.booking_id, status("Cancelled"))
        .await
        .unwrap_err();
    assert!(matches!(domain_error(&err), AequoraError::IllegalState(_)));
    assert_eq!(availability(&f.db, f.service_id).await, 2);

    // Pending cannot jump to Completed
    let err = booking::update_status(&f.db, &SandboxGateway, &f.provider, first.booking_id, status("Completed"))
        .await
        .unwrap_err();
    assert!(matches!(domain_error(&err), AequoraError::IllegalState(_)));

    booking::update_status(&f.db, &SandboxGateway, &f.provider, first.booking_id, status("Confirmed"))
        .await
        .unwrap();
    let completed = booking::update_status(&f.db, &SandboxGateway, &f.provider, first.booking_id, status("Completed"))
        .await
        .unwrap();
    assert_eq!(completed.status, BookingStatus::Completed);
    // Completion does not hand the unit back
    assert_eq!(availability(&f.db, f.service_id).await, 2);

    let completed_only = booking::list_for_provider(
        &f.db,
        &f.provider,
        &BookingFilter {
            status: Some("Completed".to_string()),
        },
    )
    .await
    .unwrap();
    assert_eq!(completed_only.len(), 1);
    assert_eq!(completed_only[0].client_name.as_deref(), Some("Test Resident"));
}

#[tokio::test]
async fn test_sandbox_payment_and_refund_on_cancel() {
    let f = fixture(1).await;

    let created = booking::create(&f.db, &no_window(), &f.resident, book(f.service_id, 0))
        .await
        .unwrap();
    let paid = payment::pay(
        &f.db,
        &SandboxGateway,
        &f.resident,
        created.booking_id,
        PayRequest {
            method: "bkash".to_string(),
        },
    )
    .await
    .unwrap();

    assert_eq!(paid.status, PaymentStatus::Paid);
    assert_eq!(paid.amount, 500.0);
    assert!(paid.transaction_id.is_some());
    assert!(paid.payment_date.is_some());

    // A paid booking cannot be paid again
    let err = payment::pay(
        &f.db,
        &SandboxGateway,
        &f.resident,
        created.booking_id,
        PayRequest {
            method: "card".to_string(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(domain_error(&err), AequoraError::IllegalState(_)));

    let cancelled = booking::cancel(&f.db, &SandboxGateway, &f.resident, created.booking_id)
        .await
        .unwrap();
    assert_eq!(cancelled.payment_status, PaymentStatus::Refunded);

    let payments = payment::list_payments(&f.db, &f.resident).await.unwrap();
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].status, PaymentStatus::Refunded);
}

async fn paid_booking(f: &Fixture, gateway: &dyn PaymentGateway) -> i32 {
    let created = booking::create(&f.db, &no_window(), &f.resident, book(f.service_id, 0))
        .await
        .unwrap();
    payment::pay(
        &f.db,
        gateway,
        &f.resident,
        created.booking_id,
        PayRequest {
            method: "Card".to_string(),
        },
    )
    .await
    .unwrap();
    created.booking_id
}

#[tokio::test]
async fn test_refund_is_sent_once_after_the_booking_is_claimed() {
    let f = fixture(1).await;
    let booking_id = paid_booking(&f, &SandboxGateway).await;
    let gateway = RecordingGateway::new(&f.db, booking_id);

    let cancelled = booking::cancel(&f.db, &gateway, &f.resident, booking_id)
        .await
        .unwrap();
    assert_eq!(cancelled.payment_status, PaymentStatus::Refunded);
    assert_eq!(*gateway.status_at_refund.lock().unwrap(), Some(BookingStatus::Cancelled));

    let err = booking::cancel(&f.db, &gateway, &f.resident, booking_id)
        .await
        .unwrap_err();
    assert!(matches!(domain_error(&err), AequoraError::IllegalState(_)));
    assert_eq!(gateway.refunds.load(Ordering::SeqCst), 1);

    let payments = payment::list_payments(&f.db, &f.resident).await.unwrap();
    assert_eq!(payments[0].status, PaymentStatus::Refunded);
    assert_eq!(availability(&f.db, f.service_id).await, 1);
}

#[tokio::test]
async fn test_failed_refund_keeps_the_booking() {
    let f = fixture(1).await;
    let booking_id = paid_booking(&f, &SandboxGateway).await;

    let err = booking::cancel(&f.db, &DownGateway, &f.resident, booking_id)
        .await
        .unwrap_err();
    assert_eq!(domain_error(&err).http_status(), 502);

    let bookings = booking::list_own(&f.db, &f.resident).await.unwrap();
    assert_eq!(bookings[0].status, BookingStatus::Pending);
    assert_eq!(bookings[0].payment_status, PaymentStatus::Paid);
    assert_eq!(availability(&f.db, f.service_id).await, 0);

    // Once the gateway is back the cancellation goes through
    let cancelled = booking::cancel(&f.db, &SandboxGateway, &f.resident, booking_id)
        .await
        .unwrap();
    assert_eq!(cancelled.payment_status, PaymentStatus::Refunded);
}

#[tokio::test]
async fn test_approved_charge_is_recorded_when_bookkeeping_fails() {
    let f = fixture(1).await;
    let gateway = BreakingGateway { db: f.db.clone() };

    let created = booking::create(&f.db, &no_window(), &f.resident, book(f.service_id, 0))
        .await
        .unwrap();
    let paid = payment::pay(
        &f.db,
        &gateway,
        &f.resident,
        created.booking_id,
        PayRequest {
            method: "Card".to_string(),
        },
    )
    .await
    .unwrap();

    assert_eq!(paid.status, PaymentStatus::Paid);
    assert_eq!(paid.transaction_id.as_deref(), Some("TX-BROKEN-1"));

    let bookings = booking::list_own(&f.db, &f.resident).await.unwrap();
    assert_eq!(bookings[0].payment_status, PaymentStatus::Paid);
}

#[tokio::test]
async fn test_gateway_failure_records_failed_payment() {
    let f = fixture(1).await;

    let created = booking::create(&f.db, &no_window(), &f.resident, book(f.service_id, 0))
        .await
        .unwrap();
    let err = payment::pay(
        &f.db,
        &DownGateway,
        &f.resident,
        created.booking_id,
        PayRequest {
            method: "Nagad".to_string(),
        },
    )
    .await
    .unwrap_err();

    let domain = domain_error(&err);
    assert!(matches!(domain, AequoraError::PaymentError(_)));
    assert_eq!(domain.http_status(), 502);

    let bookings = booking::list_own(&f.db, &f.resident).await.unwrap();
    assert_eq!(bookings[0].payment_status, PaymentStatus::Failed);

    // A failed payment may be retried
    let retried = payment::pay(
        &f.db,
        &SandboxGateway,
        &f.resident,
        created.booking_id,
        PayRequest {
            method: "Nagad".to_string(),
        },
    )
    .await
    .unwrap();
    assert_eq!(retried.status, PaymentStatus::Paid);
    assert_eq!(payment::list_payments(&f.db, &f.resident).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_cash_is_collected_on_completion() {
    let f = fixture(1).await;

    let created = booking::create(&f.db, &no_window(), &f.resident, book(f.service_id, 0))
        .await
        .unwrap();
    let pending = payment::pay(
        &f.db,
        &DownGateway,
        &f.resident,
        created.booking_id,
        PayRequest {
            method: "Cash".to_string(),
        },
    )
    .await
    .unwrap();
    // Cash never reaches the gateway
    assert_eq!(pending.status, PaymentStatus::Pending);

    booking::update_status(&f.db, &SandboxGateway, &f.provider, created.booking_id, status("Accepted"))
        .await
        .unwrap();
    let completed = booking::update_status(&f.db, &SandboxGateway, &f.provider, created.booking_id, status("Completed"))
        .await
        .unwrap();

    assert_eq!(completed.payment_status, PaymentStatus::Paid);

    let summary = dashboard::provider_summary(&f.db, &f.provider).await.unwrap();
    assert_eq!(summary.total_earnings, 500.0);
    assert_eq!(summary.completed_jobs, 1);
    assert_eq!(summary.active_bookings, 0);
    assert_eq!(summary.recent_bookings.len(), 1);
}

#[tokio::test]
async fn test_review_requires_completed_booking() {
    let f = fixture(1).await;

    let created = booking::create(&f.db, &no_window(), &f.resident, book(f.service_id, 0))
        .await
        .unwrap();
    let rating = |r: i32| ReviewRequest {
        rating: r,
        comment: Some("Quick and tidy".to_string()),
    };

    let err = review::create(&f.db, &f.resident, created.booking_id, rating(5))
        .await
        .unwrap_err();
    assert!(matches!(domain_error(&err), AequoraError::IllegalState(_)));

    booking::update_status(&f.db, &SandboxGateway, &f.provider, created.booking_id, status("Accepted"))
        .await
        .unwrap();
    booking::update_status(&f.db, &SandboxGateway, &f.provider, created.booking_id, status("Completed"))
        .await
        .unwrap();

    let created_review = review::create(&f.db, &f.resident, created.booking_id, rating(4))
        .await
        .unwrap();
    assert_eq!(created_review.service_name.as_deref(), Some("Plumbing"));

    let err = review::create(&f.db, &f.resident, created.booking_id, rating(5))
        .await
        .unwrap_err();
    assert!(matches!(domain_error(&err), AequoraError::ResourceConflict(_)));

    let received = review::list_for_provider(&f.db, &f.provider).await.unwrap();
    assert_eq!(received.stats.total_reviews, 1);
    assert_eq!(received.stats.average_rating, 4.0);
    assert_eq!(received.reviews[0].client_name.as_deref(), Some("Test Resident"));

    let bookings = booking::list_own(&f.db, &f.resident).await.unwrap();
    assert!(bookings[0].reviewed);
}

#[tokio::test]
async fn test_service_with_history_is_deactivated() {
    let f = fixture(2).await;

    let created = booking::create(&f.db, &no_window(), &f.resident, book(f.service_id, 0))
        .await
        .unwrap();

    let err = catalog::delete(&f.db, &f.provider, f.service_id).await.unwrap_err();
    assert!(matches!(domain_error(&err), AequoraError::ResourceConflict(_)));

    booking::cancel(&f.db, &SandboxGateway, &f.resident, created.booking_id)
        .await
        .unwrap();
    let removal = catalog::delete(&f.db, &f.provider, f.service_id).await.unwrap();
    assert_eq!(removal, catalog::Removal::Deactivated);

    let offered = catalog::list_for_resident(&f.db, &f.resident, &Default::default())
        .await
        .unwrap();
    assert!(offered.is_empty());
}

#[tokio::test]
async fn test_only_the_owner_can_change_a_service() {
    let f = fixture(2).await;
    let community_id = f.provider.community_id.unwrap();
    let rival = common::provider(&f.db, "rival@aequora.test", community_id).await;

    let reprice = || UpdateServiceRequest {
        price: Some(650.0),
        ..Default::default()
    };

    let err = catalog::update(&f.db, &rival, f.service_id, reprice()).await.unwrap_err();
    assert!(matches!(domain_error(&err), AequoraError::ResourceNotFound(_)));
    let err = catalog::delete(&f.db, &rival, f.service_id).await.unwrap_err();
    assert!(matches!(domain_error(&err), AequoraError::ResourceNotFound(_)));

    let updated = catalog::update(&f.db, &f.provider, f.service_id, reprice()).await.unwrap();
    assert_eq!(updated.price, 650.0);
    assert_eq!(updated.availability, 2);

    // Never booked, so the row goes away entirely
    let removal = catalog::delete(&f.db, &f.provider, f.service_id).await.unwrap();
    assert_eq!(removal, catalog::Removal::Deleted);
    assert!(catalog::list_own(&f.db, &f.provider).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_booking_workflows_are_audited() {
    let f = fixture(2).await;

    let created = booking::create(&f.db, &no_window(), &f.resident, book(f.service_id, 0))
        .await
        .unwrap();
    payment::pay(
        &f.db,
        &SandboxGateway,
        &f.resident,
        created.booking_id,
        PayRequest {
            method: "Card".to_string(),
        },
    )
    .await
    .unwrap();
    booking::update_status(&f.db, &SandboxGateway, &f.provider, created.booking_id, status("Accepted"))
        .await
        .unwrap();
    booking::cancel(&f.db, &SandboxGateway, &f.resident, created.booking_id)
        .await
        .unwrap();
    catalog::update(
        &f.db,
        &f.provider,
        f.service_id,
        UpdateServiceRequest {
            description: Some("Leaks and fittings".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(
        actions_of(&f.db, f.resident.user_id).await,
        vec!["REGISTER", "CREATE_BOOKING", "PAYMENT", "CANCEL_BOOKING"]
    );
    assert_eq!(
        actions_of(&f.db, f.provider.user_id).await,
        vec!["REGISTER", "CREATE_SERVICE", "UPDATE_BOOKING", "UPDATE_SERVICE"]
    );
}
