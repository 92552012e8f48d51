//! Remote booking service adapter.
//!
//! The service is a single action-discriminated JSON endpoint. This module
//! owns the wire types and maps responses to typed outcomes; it never
//! decides availability itself. Transport and parse faults are kept
//! distinct from the business "not available" outcome.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::draft::{AddressType, BookingDraft, ServiceType, SetupOption};
use crate::error::ClientError;
use crate::quote::BaseQuote;

/// Fallback shown when the server rejects a booking without a message.
pub const GENERIC_BOOKING_FAILURE: &str = "Booking failed. Please try again.";

/// Outcome of a non-committing availability check.
#[derive(Debug, Clone, PartialEq)]
pub enum AvailabilityResult {
    Available { quote: BaseQuote },
    Unavailable { reasons: Vec<String> },
}

/// Confirmation returned by a successful booking.
///
/// `event_date` is echoed from the submitted draft; the deposit is filled
/// in by the wizard from the client-side quote.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingConfirmation {
    pub booking_id: String,
    pub event_date: Option<NaiveDate>,
    pub deposit: Option<Decimal>,
}

/// The date/quantity combination an availability check is asked about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvailabilityQuery {
    pub date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub tables: u32,
    pub chairs: u32,
}

impl AvailabilityQuery {
    /// Build a query from the draft. `None` until an event date is set.
    pub fn from_draft(draft: &BookingDraft) -> Option<Self> {
        Some(Self {
            date: draft.schedule.start_date?,
            end_date: draft.schedule.end_date,
            start_time: draft.schedule.start_time,
            end_time: draft.schedule.end_time,
            tables: draft.items.tables,
            chairs: draft.items.chairs,
        })
    }
}

/// Seam to the remote booking service.
#[async_trait]
pub trait BookingApi: Send + Sync {
    /// Non-committing inventory query for a date/quantity combination.
    async fn check_availability(
        &self,
        query: &AvailabilityQuery,
    ) -> Result<AvailabilityResult, ClientError>;

    /// Submit the full draft as a booking.
    async fn book(&self, draft: &BookingDraft) -> Result<BookingConfirmation, ClientError>;
}

// ── Wire types ───────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
enum ApiRequest<'a> {
    CheckAvailability {
        date: NaiveDate,
        #[serde(skip_serializing_if = "Option::is_none")]
        end_date: Option<NaiveDate>,
        #[serde(skip_serializing_if = "Option::is_none")]
        start_time: Option<NaiveTime>,
        #[serde(skip_serializing_if = "Option::is_none")]
        end_time: Option<NaiveTime>,
        tables: u32,
        chairs: u32,
    },
    Book {
        date: Option<NaiveDate>,
        #[serde(skip_serializing_if = "Option::is_none")]
        end_date: Option<NaiveDate>,
        #[serde(skip_serializing_if = "Option::is_none")]
        start_time: Option<NaiveTime>,
        #[serde(skip_serializing_if = "Option::is_none")]
        end_time: Option<NaiveTime>,
        tables: u32,
        chairs: u32,
        service_type: Option<ServiceType>,
        customer_name: &'a str,
        phone: &'a str,
        #[serde(skip_serializing_if = "Option::is_none")]
        address_type: Option<AddressType>,
        address: &'a str,
        setup_option: Option<SetupOption>,
        signature: &'a str,
        trash_agreement: bool,
        folding_agreement: bool,
        waiver_agreement: bool,
    },
}

impl<'a> ApiRequest<'a> {
    fn check(query: &AvailabilityQuery) -> Self {
        Self::CheckAvailability {
            date: query.date,
            end_date: query.end_date,
            start_time: query.start_time,
            end_time: query.end_time,
            tables: query.tables,
            chairs: query.chairs,
        }
    }

    fn book(draft: &'a BookingDraft) -> Self {
        Self::Book {
            date: draft.schedule.start_date,
            end_date: draft.schedule.end_date,
            start_time: draft.schedule.start_time,
            end_time: draft.schedule.end_time,
            tables: draft.items.tables,
            chairs: draft.items.chairs,
            service_type: draft.service_type,
            customer_name: &draft.customer.name,
            phone: &draft.customer.phone,
            address_type: draft.address_type,
            address: &draft.address,
            setup_option: draft.setup_option,
            signature: &draft.customer.signature,
            trash_agreement: draft.agreements.trash,
            folding_agreement: draft.agreements.folding,
            waiver_agreement: draft.agreements.waiver,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    status: String,
    #[serde(default)]
    data: Option<serde_json::Value>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AvailabilityData {
    available: bool,
    #[serde(default)]
    quote: Option<QuotePayload>,
    #[serde(default)]
    issues: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct QuotePayload {
    total_price: f64,
    #[serde(default)]
    discount_applied: Option<f64>,
    #[serde(default)]
    full_sets_applied: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct BookData {
    booking_id: String,
}

fn decimal_from_wire(value: f64, field: &str) -> Result<Decimal, ClientError> {
    Decimal::from_f64_retain(value)
        .ok_or_else(|| ClientError::InvalidResponse(format!("{field} is not a valid amount: {value}")))
}

fn map_availability_response(body: ApiResponse) -> Result<AvailabilityResult, ClientError> {
    if body.status != "success" {
        return Err(ClientError::InvalidResponse(format!(
            "unexpected status {:?} on availability check",
            body.status
        )));
    }
    let data = body
        .data
        .ok_or_else(|| ClientError::InvalidResponse("missing data field".to_string()))?;
    let data: AvailabilityData = serde_json::from_value(data)
        .map_err(|e| ClientError::InvalidResponse(e.to_string()))?;

    if data.available {
        let payload = data
            .quote
            .ok_or_else(|| ClientError::InvalidResponse("available but no quote".to_string()))?;
        let quote = BaseQuote {
            total_price: decimal_from_wire(payload.total_price, "total_price")?,
            discount_applied: payload
                .discount_applied
                .map(|d| decimal_from_wire(d, "discount_applied"))
                .transpose()?,
            full_sets_applied: payload.full_sets_applied.unwrap_or(0),
        };
        Ok(AvailabilityResult::Available { quote })
    } else {
        Ok(AvailabilityResult::Unavailable {
            reasons: data.issues,
        })
    }
}

fn map_book_response(
    http_success: bool,
    body: Result<ApiResponse, String>,
) -> Result<String, ClientError> {
    match (http_success, body) {
        (true, Ok(resp)) if resp.status == "success" => {
            let data = resp
                .data
                .ok_or_else(|| ClientError::InvalidResponse("missing data field".to_string()))?;
            let data: BookData = serde_json::from_value(data)
                .map_err(|e| ClientError::InvalidResponse(e.to_string()))?;
            Ok(data.booking_id)
        }
        // Server answered but refused the booking, e.g. the inventory race
        // was lost between check and submit.
        (_, Ok(resp)) => Err(ClientError::Rejected {
            message: resp
                .message
                .unwrap_or_else(|| GENERIC_BOOKING_FAILURE.to_string()),
        }),
        (true, Err(parse_err)) => Err(ClientError::InvalidResponse(parse_err)),
        (false, Err(_)) => Err(ClientError::Transport(
            "booking service returned an error".to_string(),
        )),
    }
}

// ── HTTP client ──────────────────────────────────────────────────────

/// HTTP adapter for the booking service.
pub struct HttpBookingClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpBookingClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    async fn post(&self, request: &ApiRequest<'_>) -> Result<reqwest::Response, ClientError> {
        self.client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))
    }
}

#[async_trait]
impl BookingApi for HttpBookingClient {
    async fn check_availability(
        &self,
        query: &AvailabilityQuery,
    ) -> Result<AvailabilityResult, ClientError> {
        tracing::debug!(
            date = %query.date,
            tables = query.tables,
            chairs = query.chairs,
            "Checking availability"
        );
        let resp = self.post(&ApiRequest::check(query)).await?;
        if !resp.status().is_success() {
            return Err(ClientError::Transport(format!(
                "booking service returned {}",
                resp.status()
            )));
        }
        let body: ApiResponse = resp
            .json()
            .await
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))?;
        map_availability_response(body)
    }

    async fn book(&self, draft: &BookingDraft) -> Result<BookingConfirmation, ClientError> {
        tracing::info!(
            customer = %draft.customer.name,
            tables = draft.items.tables,
            chairs = draft.items.chairs,
            "Submitting booking"
        );
        let resp = self.post(&ApiRequest::book(draft)).await?;
        let http_success = resp.status().is_success();
        let body = resp
            .bytes()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        let parsed =
            serde_json::from_slice::<ApiResponse>(&body).map_err(|e| e.to_string());

        let booking_id = map_book_response(http_success, parsed)?;
        tracing::info!(booking_id = %booking_id, "Booking confirmed");
        Ok(BookingConfirmation {
            booking_id,
            event_date: draft.schedule.start_date,
            deposit: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn api_response(value: serde_json::Value) -> ApiResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn available_response_maps_to_quote() {
        let body = api_response(json!({
            "status": "success",
            "data": {
                "available": true,
                "quote": { "total_price": 100.0, "discount_applied": 20.0, "full_sets_applied": 4 }
            }
        }));
        let result = map_availability_response(body).unwrap();
        match result {
            AvailabilityResult::Available { quote } => {
                assert_eq!(quote.total_price, dec!(100));
                assert_eq!(quote.discount_applied, Some(dec!(20)));
                assert_eq!(quote.full_sets_applied, 4);
            }
            other => panic!("expected Available, got {other:?}"),
        }
    }

    #[test]
    fn unavailable_response_keeps_reason_order() {
        let body = api_response(json!({
            "status": "success",
            "data": { "available": false, "issues": ["only 2 tables left", "only 10 chairs left"] }
        }));
        let result = map_availability_response(body).unwrap();
        assert_eq!(
            result,
            AvailabilityResult::Unavailable {
                reasons: vec![
                    "only 2 tables left".to_string(),
                    "only 10 chairs left".to_string()
                ]
            }
        );
    }

    #[test]
    fn available_without_quote_is_invalid_response() {
        let body = api_response(json!({
            "status": "success",
            "data": { "available": true }
        }));
        assert!(matches!(
            map_availability_response(body),
            Err(ClientError::InvalidResponse(_))
        ));
    }

    #[test]
    fn unexpected_status_is_never_unavailable() {
        let body = api_response(json!({ "status": "error", "message": "boom" }));
        assert!(matches!(
            map_availability_response(body),
            Err(ClientError::InvalidResponse(_))
        ));
    }

    #[test]
    fn book_success_extracts_booking_id() {
        let body = api_response(json!({
            "status": "success",
            "data": { "booking_id": "BK-0042" }
        }));
        assert_eq!(map_book_response(true, Ok(body)).unwrap(), "BK-0042");
    }

    #[test]
    fn book_rejection_carries_server_message() {
        let body = api_response(json!({
            "status": "conflict",
            "message": "Sold out while you were typing"
        }));
        match map_book_response(false, Ok(body)) {
            Err(ClientError::Rejected { message }) => {
                assert_eq!(message, "Sold out while you were typing");
            }
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    #[test]
    fn book_rejection_without_message_uses_fallback() {
        let body = api_response(json!({ "status": "error" }));
        match map_book_response(true, Ok(body)) {
            Err(ClientError::Rejected { message }) => {
                assert_eq!(message, GENERIC_BOOKING_FAILURE);
            }
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    #[test]
    fn unparseable_body_is_a_fault_not_a_rejection() {
        let result = map_book_response(true, Err("not json".to_string()));
        assert!(matches!(result, Err(ClientError::InvalidResponse(_))));

        let result = map_book_response(false, Err("not json".to_string()));
        assert!(matches!(result, Err(ClientError::Transport(_))));
    }

    #[test]
    fn check_request_serializes_with_action_tag() {
        let query = AvailabilityQuery {
            date: NaiveDate::from_ymd_opt(2026, 6, 5).unwrap(),
            end_date: None,
            start_time: None,
            end_time: None,
            tables: 3,
            chairs: 12,
        };
        let json = serde_json::to_value(ApiRequest::check(&query)).unwrap();
        assert_eq!(json["action"], "check_availability");
        assert_eq!(json["date"], "2026-06-05");
        assert_eq!(json["tables"], 3);
        assert_eq!(json["chairs"], 12);
        assert!(json.get("end_date").is_none());
    }

    #[test]
    fn book_request_carries_full_draft() {
        let mut draft = BookingDraft::new();
        draft.apply_service_type(ServiceType::Pickup);
        draft.schedule.start_date = NaiveDate::from_ymd_opt(2026, 6, 5);
        draft.items.tables = 2;
        draft.customer.name = "Alice".into();
        draft.customer.phone = "5551234567".into();
        draft.customer.signature = "Alice".into();
        draft.agreements = crate::draft::Agreements {
            trash: true,
            folding: true,
            waiver: true,
        };

        let json = serde_json::to_value(ApiRequest::book(&draft)).unwrap();
        assert_eq!(json["action"], "book");
        assert_eq!(json["customer_name"], "Alice");
        assert_eq!(json["service_type"], "pickup");
        assert_eq!(json["setup_option"], "none");
        assert_eq!(json["address"], crate::draft::SELF_PICKUP_ADDRESS);
        assert_eq!(json["trash_agreement"], true);
    }
}
