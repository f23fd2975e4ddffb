//! Booking, payment and review models

use serde::{Deserialize, Serialize};
use validator::Validate;

use aequora_persistence::entity::sea_orm_active_enums::{
    BookingStatus, PaymentMethod, PaymentStatus,
};
use aequora_persistence::entity::{booking, payment, review};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBookingRequest {
    #[serde(alias = "serviceid", alias = "service")]
    pub service_id: i32,
    #[serde(alias = "servicedate")]
    pub service_date: chrono::NaiveDate,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookingStatusRequest {
    pub status: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookingFilter {
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingInfo {
    pub booking_id: i32,
    pub service_id: i32,
    pub service_name: Option<String>,
    pub resident_id: i32,
    pub client_name: Option<String>,
    pub provider_id: i32,
    pub provider_name: Option<String>,
    pub community_id: i32,
    pub booking_date: chrono::NaiveDate,
    pub service_date: chrono::NaiveDate,
    pub status: BookingStatus,
    pub price: f64,
    pub payment_status: PaymentStatus,
    pub created_at: chrono::NaiveDateTime,
    pub reviewed: bool,
}

impl From<booking::Model> for BookingInfo {
    fn from(value: booking::Model) -> Self {
        Self {
            booking_id: value.booking_id,
            service_id: value.service_id,
            service_name: None,
            resident_id: value.resident_id,
            client_name: None,
            provider_id: value.provider_id,
            provider_name: None,
            community_id: value.community_id,
            booking_date: value.booking_date,
            service_date: value.service_date,
            status: value.status,
            price: value.price,
            payment_status: value.payment_status,
            created_at: value.created_at,
            reviewed: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PayRequest {
    #[serde(alias = "payment_method")]
    pub method: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentInfo {
    pub payment_id: i32,
    pub booking_id: i32,
    pub amount: f64,
    pub method: PaymentMethod,
    pub transaction_id: Option<String>,
    pub payment_date: Option<chrono::NaiveDateTime>,
    pub status: PaymentStatus,
}

impl From<payment::Model> for PaymentInfo {
    fn from(value: payment::Model) -> Self {
        Self {
            payment_id: value.payment_id,
            booking_id: value.booking_id,
            amount: value.amount,
            method: value.method,
            transaction_id: value.transaction_id,
            payment_date: value.payment_date,
            status: value.status,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ReviewRequest {
    #[validate(range(min = 1, max = 5))]
    pub rating: i32,
    #[validate(length(max = 2000))]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewInfo {
    pub id: i32,
    pub booking_id: i32,
    pub client_name: Option<String>,
    pub service_name: Option<String>,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: chrono::NaiveDateTime,
}

impl From<review::Model> for ReviewInfo {
    fn from(value: review::Model) -> Self {
        Self {
            id: value.review_id,
            booking_id: value.booking_id,
            client_name: None,
            service_name: None,
            rating: value.rating,
            comment: value.comment,
            created_at: value.created_at,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ReviewStats {
    pub average_rating: f64,
    pub total_reviews: u64,
}

impl ReviewStats {
    /// Average rounded to one decimal place
    pub fn from_ratings(ratings: &[i32]) -> Self {
        if ratings.is_empty() {
            return Self::default();
        }

        let sum: i64 = ratings.iter().map(|r| *r as i64).sum();
        let average = sum as f64 / ratings.len() as f64;

        Self {
            average_rating: (average * 10.0).round() / 10.0,
            total_reviews: ratings.len() as u64,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProviderReviews {
    pub reviews: Vec<ReviewInfo>,
    pub stats: ReviewStats,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::validate;

    #[test]
    fn test_review_stats() {
        assert_eq!(ReviewStats::from_ratings(&[]), ReviewStats::default());

        let stats = ReviewStats::from_ratings(&[5, 4, 4]);
        assert_eq!(stats.total_reviews, 3);
        assert_eq!(stats.average_rating, 4.3);
    }

    #[test]
    fn test_rating_range() {
        for rating in [0, 6] {
            let req = ReviewRequest {
                rating,
                comment: None,
            };
            assert!(validate(&req).is_err());
        }
        let req = ReviewRequest {
            rating: 5,
            comment: Some("Great".to_string()),
        };
        assert!(validate(&req).is_ok());
    }

    #[test]
    fn test_booking_request_legacy_keys() {
        let req: CreateBookingRequest =
            serde_json::from_str(r#"{"serviceid": 3, "servicedate": "2030-01-15"}"#).unwrap();
        assert_eq!(req.service_id, 3);
        assert_eq!(
            req.service_date,
            chrono::NaiveDate::from_ymd_opt(2030, 1, 15).unwrap()
        );
    }
}
