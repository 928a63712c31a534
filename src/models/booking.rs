//! Booking model and the rules governing its lifecycle

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;
use uuid::Uuid;

use super::book::BookProfile;
use crate::error::{AppError, AppResult};

/// Booking status. `Approved` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Approved,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Approved => "approved",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, BookingStatus::Pending)
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "approved" => Ok(BookingStatus::Approved),
            "cancelled" => Ok(BookingStatus::Cancelled),
            _ => Err(format!("Invalid booking status: {}", s)),
        }
    }
}

// SQLx conversion for BookingStatus
impl sqlx::Type<Postgres> for BookingStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<Postgres>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Postgres> for BookingStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for BookingStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode(self.as_str(), buf)
    }
}

/// Booking record from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub book_id: Uuid,
    pub quantity: i32,
    pub status: BookingStatus,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// Create booking request. Any status in the body is ignored.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBooking {
    pub quantity: i32,
}

/// Update booking request: at most one of the two fields
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateBooking {
    pub quantity: Option<i32>,
    pub status: Option<BookingStatus>,
}

/// Body keys an update may never carry
pub const IMMUTABLE_BOOKING_FIELDS: &[&str] = &["user_id", "book_id"];

impl UpdateBooking {
    /// Reject bodies that try to move the booking to another user or book,
    /// or change quantity and status at once. Runs before the booking is loaded.
    pub fn check_shape(body: &serde_json::Value) -> AppResult<()> {
        let Some(map) = body.as_object() else {
            return Ok(());
        };

        if IMMUTABLE_BOOKING_FIELDS.iter().any(|f| map.contains_key(*f)) {
            return Err(AppError::Authorization(
                "booking owner and book cannot be changed".to_string(),
            ));
        }

        if map.contains_key("quantity") && map.contains_key("status") {
            return Err(AppError::Authorization(
                "quantity and status cannot be changed together".to_string(),
            ));
        }

        Ok(())
    }
}

/// The caller as seen by the booking rules
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub user_id: Uuid,
    pub is_moderator: bool,
}

/// Values written by a booking update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingChanges {
    pub quantity: i32,
    pub status: BookingStatus,
}

impl Booking {
    /// Decide whether `actor` may apply `update`, and what gets written.
    ///
    /// Terminal bookings are immutable; only the owner or a moderator may
    /// touch a booking; only a moderator may approve.
    pub fn plan_update(&self, actor: Actor, update: &UpdateBooking) -> AppResult<BookingChanges> {
        if self.status.is_terminal() {
            return Err(AppError::Authorization(format!(
                "booking is already {}",
                self.status
            )));
        }

        if !actor.is_moderator && actor.user_id != self.user_id {
            return Err(AppError::forbidden());
        }

        if update.status == Some(BookingStatus::Approved) && !actor.is_moderator {
            return Err(AppError::Authorization(
                "only moderators can approve bookings".to_string(),
            ));
        }

        Ok(BookingChanges {
            quantity: update.quantity.unwrap_or(self.quantity),
            status: update.status.unwrap_or(self.status),
        })
    }
}

/// Sales report query string
#[derive(Debug, Deserialize, ToSchema, utoipa::IntoParams)]
pub struct SalesReportQuery {
    #[serde(rename = "startDate")]
    pub start_date: Option<String>,
    #[serde(rename = "endDate")]
    pub end_date: Option<String>,
}

impl SalesReportQuery {
    /// Resolve the inclusive creation-time window of the report.
    /// Plain dates cover the whole day.
    pub fn range(&self) -> AppResult<(DateTime<Utc>, DateTime<Utc>)> {
        let start = parse_bound(self.start_date.as_deref(), "startDate", false)?;
        let end = parse_bound(self.end_date.as_deref(), "endDate", true)?;

        if start > end {
            return Err(AppError::Validation("start must be before end".to_string()));
        }

        Ok((start, end))
    }
}

fn parse_bound(raw: Option<&str>, field: &str, end_of_day: bool) -> AppResult<DateTime<Utc>> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::Validation(format!("query must have a '{}' field", field)))?;

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("'{}' must be a valid date", field)))?;

    let time = if end_of_day {
        NaiveTime::from_hms_milli_opt(23, 59, 59, 999)
    } else {
        NaiveTime::from_hms_opt(0, 0, 0)
    }
    .ok_or_else(|| AppError::Internal("invalid time of day".to_string()))?;

    Ok(date.and_time(time).and_utc())
}

/// Total booked quantity for one book in a sales report
#[derive(Debug, Clone, FromRow)]
pub struct SalesTotal {
    pub book_id: Uuid,
    pub count: i64,
}

/// One line of the sales report
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SalesEntry {
    #[serde(flatten)]
    pub book: BookProfile,
    pub count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn booking(owner: Uuid, status: BookingStatus) -> Booking {
        Booking {
            id: Uuid::new_v4(),
            user_id: owner,
            book_id: Uuid::new_v4(),
            quantity: 3,
            status,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn owner_actor(b: &Booking) -> Actor {
        Actor {
            user_id: b.user_id,
            is_moderator: false,
        }
    }

    fn moderator() -> Actor {
        Actor {
            user_id: Uuid::new_v4(),
            is_moderator: true,
        }
    }

    #[test]
    fn test_terminal_bookings_are_immutable() {
        for status in [BookingStatus::Approved, BookingStatus::Cancelled] {
            let b = booking(Uuid::new_v4(), status);
            let update = UpdateBooking {
                quantity: Some(5),
                status: None,
            };
            assert!(matches!(
                b.plan_update(owner_actor(&b), &update),
                Err(AppError::Authorization(_))
            ));
            assert!(matches!(
                b.plan_update(moderator(), &update),
                Err(AppError::Authorization(_))
            ));
        }
    }

    #[test]
    fn test_non_moderator_never_approves() {
        let b = booking(Uuid::new_v4(), BookingStatus::Pending);
        let update = UpdateBooking {
            quantity: None,
            status: Some(BookingStatus::Approved),
        };
        assert!(b.plan_update(owner_actor(&b), &update).is_err());

        let changes = b.plan_update(moderator(), &update).unwrap();
        assert_eq!(changes.status, BookingStatus::Approved);
        assert_eq!(changes.quantity, 3);
    }

    #[test]
    fn test_owner_can_cancel_and_change_quantity() {
        let b = booking(Uuid::new_v4(), BookingStatus::Pending);

        let changes = b
            .plan_update(
                owner_actor(&b),
                &UpdateBooking {
                    quantity: None,
                    status: Some(BookingStatus::Cancelled),
                },
            )
            .unwrap();
        assert_eq!(changes, BookingChanges { quantity: 3, status: BookingStatus::Cancelled });

        let changes = b
            .plan_update(
                owner_actor(&b),
                &UpdateBooking {
                    quantity: Some(10),
                    status: None,
                },
            )
            .unwrap();
        assert_eq!(changes, BookingChanges { quantity: 10, status: BookingStatus::Pending });
    }

    #[test]
    fn test_stranger_cannot_touch_booking() {
        let b = booking(Uuid::new_v4(), BookingStatus::Pending);
        let stranger = Actor {
            user_id: Uuid::new_v4(),
            is_moderator: false,
        };
        let update = UpdateBooking {
            quantity: None,
            status: Some(BookingStatus::Cancelled),
        };
        assert!(matches!(
            b.plan_update(stranger, &update),
            Err(AppError::Authorization(_))
        ));
    }

    #[test]
    fn test_check_shape() {
        assert!(UpdateBooking::check_shape(&json!({ "quantity": 2 })).is_ok());
        assert!(UpdateBooking::check_shape(&json!({ "status": "cancelled" })).is_ok());
        assert!(UpdateBooking::check_shape(&json!({ "quantity": 2, "status": "cancelled" })).is_err());
        assert!(UpdateBooking::check_shape(&json!({ "user_id": "x" })).is_err());
        assert!(UpdateBooking::check_shape(&json!({ "book_id": "x", "quantity": 1 })).is_err());
    }

    #[test]
    fn test_report_range() {
        let q = SalesReportQuery {
            start_date: Some("2024-01-01".to_string()),
            end_date: Some("2024-01-31".to_string()),
        };
        let (start, end) = q.range().unwrap();
        assert_eq!(start.to_rfc3339(), "2024-01-01T00:00:00+00:00");
        assert!(end > start);
        assert_eq!(end.date_naive().to_string(), "2024-01-31");

        let reversed = SalesReportQuery {
            start_date: Some("2024-02-01".to_string()),
            end_date: Some("2024-01-01".to_string()),
        };
        assert!(matches!(reversed.range(), Err(AppError::Validation(_))));

        let missing = SalesReportQuery {
            start_date: None,
            end_date: Some("2024-01-01".to_string()),
        };
        assert!(matches!(missing.range(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_status_strings() {
        assert_eq!("approved".parse::<BookingStatus>().unwrap(), BookingStatus::Approved);
        assert!("returned".parse::<BookingStatus>().is_err());
        assert!(!BookingStatus::Pending.is_terminal());
        assert!(BookingStatus::Cancelled.is_terminal());
    }
}
