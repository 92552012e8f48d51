//! End-to-end tests for the booking flow.
//!
//! Each test spins up an Axum mock of the booking service on a random
//! port and drives the wizard through the real HTTP client, exercising
//! the full intent → validation → remote call → render loop.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use chrono::{NaiveDate, NaiveTime};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::time::timeout;

use rental_booking::client::{
    AvailabilityQuery, AvailabilityResult, BookingApi, HttpBookingClient,
};
use rental_booking::config::WizardConfig;
use rental_booking::draft::{
    AddressType, AgreementKind, ItemKind, ServiceType, SetupOption,
};
use rental_booking::error::ClientError;
use rental_booking::wizard::{BookingWizard, FieldEdit, Intent, StatusKind};

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Scripted booking service: one fixed check response, queued book responses.
struct MockBookingService {
    check_response: Value,
    book_responses: Mutex<VecDeque<(StatusCode, Value)>>,
}

impl MockBookingService {
    fn available(total_price: f64) -> Self {
        Self {
            check_response: json!({
                "status": "success",
                "data": { "available": true, "quote": { "total_price": total_price } }
            }),
            book_responses: Mutex::new(VecDeque::new()),
        }
    }

    fn unavailable(issues: &[&str]) -> Self {
        Self {
            check_response: json!({
                "status": "success",
                "data": { "available": false, "issues": issues }
            }),
            book_responses: Mutex::new(VecDeque::new()),
        }
    }

    fn with_book(self, status: StatusCode, body: Value) -> Self {
        self.book_responses.lock().unwrap().push_back((status, body));
        self
    }
}

async fn booking_endpoint(
    State(service): State<Arc<MockBookingService>>,
    Json(request): Json<Value>,
) -> (StatusCode, Json<Value>) {
    match request["action"].as_str() {
        Some("check_availability") => (StatusCode::OK, Json(service.check_response.clone())),
        Some("book") => {
            let scripted = service.book_responses.lock().unwrap().pop_front();
            match scripted {
                Some((status, body)) => (status, Json(body)),
                None => (
                    StatusCode::OK,
                    Json(json!({
                        "status": "success",
                        "data": { "booking_id": uuid::Uuid::new_v4().to_string() }
                    })),
                ),
            }
        }
        other => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "status": "error", "message": format!("unknown action {other:?}") })),
        ),
    }
}

/// Start the mock service on a random port, return its endpoint URL.
async fn start_service(service: MockBookingService) -> String {
    let app = Router::new()
        .route("/", post(booking_endpoint))
        .with_state(Arc::new(service));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Give the server a moment to start accepting connections.
    tokio::time::sleep(Duration::from_millis(50)).await;

    format!("http://127.0.0.1:{port}/")
}

fn wizard_for(endpoint: &str) -> BookingWizard<HttpBookingClient> {
    let config = WizardConfig {
        endpoint: endpoint.to_string(),
        ..WizardConfig::default()
    };
    BookingWizard::from_config(config)
}

fn event_date() -> NaiveDate {
    chrono::Local::now().date_naive() + chrono::Days::new(14)
}

/// Drive a dropoff flow up to (and including) the availability check.
async fn check_availability(wizard: &mut BookingWizard<HttpBookingClient>) {
    wizard
        .handle(Intent::FieldChanged(FieldEdit::ServiceType(
            ServiceType::Dropoff,
        )))
        .await;
    wizard.handle(Intent::NextStep).await;

    let date = event_date();
    for edit in [
        FieldEdit::StartDate(date),
        FieldEdit::StartTime(NaiveTime::from_hms_opt(10, 0, 0).unwrap()),
        FieldEdit::EndDate(date),
        FieldEdit::EndTime(NaiveTime::from_hms_opt(18, 0, 0).unwrap()),
        FieldEdit::Quantity(ItemKind::Tables, 3),
        FieldEdit::Quantity(ItemKind::Chairs, 12),
    ] {
        wizard.handle(Intent::FieldChanged(edit)).await;
    }
    wizard.handle(Intent::CheckAvailability).await;
}

/// Continue a checked dropoff flow to the review step, selecting the
/// standard setup option (fee 20).
async fn fill_to_review(wizard: &mut BookingWizard<HttpBookingClient>) {
    wizard.handle(Intent::NextStep).await;
    for edit in [
        FieldEdit::CustomerName("Alice".to_string()),
        FieldEdit::Phone("(555) 123-4567".to_string()),
        FieldEdit::AddressType(AddressType::Residence),
        FieldEdit::Address("12 Elm St".to_string()),
    ] {
        wizard.handle(Intent::FieldChanged(edit)).await;
    }
    wizard.handle(Intent::NextStep).await;
    wizard
        .handle(Intent::FieldChanged(FieldEdit::SetupOption(
            SetupOption::Standard,
        )))
        .await;
    wizard.handle(Intent::NextStep).await;
    for kind in [
        AgreementKind::Trash,
        AgreementKind::Folding,
        AgreementKind::Waiver,
    ] {
        wizard
            .handle(Intent::FieldChanged(FieldEdit::Agreement(kind, true)))
            .await;
    }
    wizard
        .handle(Intent::FieldChanged(FieldEdit::Signature("Alice".to_string())))
        .await;
}

#[tokio::test]
async fn available_quote_plus_setup_fee_yields_final_totals() {
    timeout(TEST_TIMEOUT, async {
        let endpoint = start_service(MockBookingService::available(100.0)).await;
        let mut wizard = wizard_for(&endpoint);

        check_availability(&mut wizard).await;
        let render = wizard.render();
        assert_eq!(
            render.status.as_ref().map(|s| s.kind),
            Some(StatusKind::Success)
        );
        assert_eq!(render.base_quote.unwrap().total, "$100.00");

        fill_to_review(&mut wizard).await;
        let render = wizard.render();
        assert_eq!(render.step_name, Some("review"));
        let quote = render.final_quote.expect("final quote cached on advance");
        assert_eq!(quote.add_on_fee, "$20.00");
        assert_eq!(quote.total, "$120.00");
        assert_eq!(quote.deposit, "$60.00");

        let render = wizard.handle(Intent::Submit).await;
        let confirmation = render.confirmation.expect("booking should confirm");
        assert!(!confirmation.booking_id.is_empty());
        assert_eq!(confirmation.deposit.as_deref(), Some("$60.00"));
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn unavailable_inventory_pins_wizard_to_availability_step() {
    timeout(TEST_TIMEOUT, async {
        let endpoint =
            start_service(MockBookingService::unavailable(&["only 2 tables left"])).await;
        let mut wizard = wizard_for(&endpoint);

        check_availability(&mut wizard).await;
        let render = wizard.render();
        assert_eq!(render.step_name, Some("availability"));
        assert_eq!(render.availability_reasons, vec!["only 2 tables left"]);
        assert_eq!(
            render.status.as_ref().map(|s| s.kind),
            Some(StatusKind::Unavailable)
        );

        let render = wizard.handle(Intent::NextStep).await;
        assert_eq!(render.step_name, Some("availability"));
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn booking_conflict_surfaces_message_and_allows_resubmission() {
    timeout(TEST_TIMEOUT, async {
        let service = MockBookingService::available(100.0).with_book(
            StatusCode::CONFLICT,
            json!({ "status": "conflict", "message": "Sold out while you were typing" }),
        );
        let endpoint = start_service(service).await;
        let mut wizard = wizard_for(&endpoint);

        check_availability(&mut wizard).await;
        fill_to_review(&mut wizard).await;

        let render = wizard.handle(Intent::Submit).await;
        assert_eq!(render.step_name, Some("review"), "must stay on review");
        let status = render.status.expect("conflict must be shown");
        assert_eq!(status.kind, StatusKind::BookingConflict);
        assert_eq!(status.text, "Sold out while you were typing");
        assert_eq!(wizard.state().draft.customer.name, "Alice", "draft intact");

        // Second submit hits the default success response.
        let render = wizard.handle(Intent::Submit).await;
        assert!(render.confirmation.is_some());
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn unreachable_service_is_a_transport_error_not_unavailable() {
    timeout(TEST_TIMEOUT, async {
        // Nothing is listening here.
        let mut wizard = wizard_for("http://127.0.0.1:9/");

        check_availability(&mut wizard).await;
        let render = wizard.render();
        assert_eq!(
            render.status.as_ref().map(|s| s.kind),
            Some(StatusKind::TransportError)
        );
        assert!(render.availability_reasons.is_empty());
        assert_eq!(render.step_name, Some("availability"));
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn raw_client_maps_check_and_book_responses() {
    timeout(TEST_TIMEOUT, async {
        let endpoint = start_service(MockBookingService::available(87.5)).await;
        let client = HttpBookingClient::new(&endpoint);

        let query = AvailabilityQuery {
            date: event_date(),
            end_date: None,
            start_time: None,
            end_time: None,
            tables: 2,
            chairs: 8,
        };
        match client.check_availability(&query).await.unwrap() {
            AvailabilityResult::Available { quote } => {
                assert_eq!(quote.total_price.to_string(), "87.5");
            }
            other => panic!("expected Available, got {other:?}"),
        }
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn book_rejection_without_message_uses_generic_fallback() {
    timeout(TEST_TIMEOUT, async {
        let service = MockBookingService::available(100.0)
            .with_book(StatusCode::OK, json!({ "status": "error" }));
        let endpoint = start_service(service).await;
        let client = HttpBookingClient::new(&endpoint);

        let mut draft = rental_booking::draft::BookingDraft::new();
        draft.apply_service_type(ServiceType::Pickup);
        draft.schedule.start_date = Some(event_date());
        draft.items.tables = 1;

        match client.book(&draft).await {
            Err(ClientError::Rejected { message }) => {
                assert_eq!(message, rental_booking::client::GENERIC_BOOKING_FAILURE);
            }
            other => panic!("expected Rejected, got {other:?}"),
        }
    })
    .await
    .expect("test timed out");
}
