//! Per-step validation of the booking draft.
//!
//! Validation is step-local: validating step N trusts the gating that
//! already happened on earlier steps. Requiredness that depends on the
//! service type is read from the draft's applied `required` set, not
//! re-derived here.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::draft::{BookingDraft, ServiceType};
use crate::wizard::Step;

/// Permissive phone pattern: optional leading +, then digits with common
/// separators, 7–20 characters.
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[\d\s().-]{7,20}$").expect("phone regex is valid"));

/// Closed set of form fields (and exclusive-choice groups) the wizard knows.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum FieldId {
    ServiceType,
    StartDate,
    StartTime,
    EndDate,
    EndTime,
    ItemQuantities,
    CustomerName,
    Phone,
    AddressType,
    Address,
    SetupOption,
    Signature,
    TrashAgreement,
    FoldingAgreement,
    WaiverAgreement,
}

/// A single validation failure, attributed to a field or choice group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldFailure {
    pub field: FieldId,
    pub message: String,
}

impl FieldFailure {
    fn new(field: FieldId, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Outcome of validating one step. Failures are in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepReport {
    pub failures: Vec<FieldFailure>,
}

impl StepReport {
    pub fn is_valid(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn has_failure_for(&self, field: FieldId) -> bool {
        self.failures.iter().any(|f| f.field == field)
    }
}

/// Fields required for a given service type.
///
/// Pickup flows drop the address, setup, and end-of-range requirements;
/// the customer only needs a collection date.
pub fn required_fields_for(service_type: ServiceType) -> BTreeSet<FieldId> {
    use FieldId::*;
    let mut set = BTreeSet::from([
        ServiceType,
        StartDate,
        ItemQuantities,
        CustomerName,
        Phone,
        Signature,
        TrashAgreement,
        FoldingAgreement,
        WaiverAgreement,
    ]);
    if service_type == crate::draft::ServiceType::Dropoff {
        set.extend([StartTime, EndDate, EndTime, AddressType, Address, SetupOption]);
    }
    set
}

/// Validate a single step of the draft.
///
/// `today` is passed in so past-date checks stay deterministic under test.
pub fn validate_step(step: Step, draft: &BookingDraft, today: NaiveDate) -> StepReport {
    let mut failures = Vec::new();

    match step {
        Step::ServiceType => {
            if draft.service_type.is_none() {
                failures.push(FieldFailure::new(
                    FieldId::ServiceType,
                    "Choose a service type.",
                ));
            }
        }
        Step::Availability => {
            match draft.schedule.start_date {
                None => failures.push(FieldFailure::new(
                    FieldId::StartDate,
                    "Choose an event date.",
                )),
                Some(date) if date < today => failures.push(FieldFailure::new(
                    FieldId::StartDate,
                    "The event date cannot be in the past.",
                )),
                Some(_) => {}
            }
            if draft.is_required(FieldId::StartTime) && draft.schedule.start_time.is_none() {
                failures.push(FieldFailure::new(FieldId::StartTime, "Choose a start time."));
            }
            if draft.is_required(FieldId::EndDate) && draft.schedule.end_date.is_none() {
                failures.push(FieldFailure::new(FieldId::EndDate, "Choose an end date."));
            }
            if draft.is_required(FieldId::EndTime) && draft.schedule.end_time.is_none() {
                failures.push(FieldFailure::new(FieldId::EndTime, "Choose an end time."));
            }
            if draft.items.is_empty() {
                failures.push(FieldFailure::new(
                    FieldId::ItemQuantities,
                    "Please select at least one item to rent.",
                ));
            }
        }
        Step::EventDetails => {
            if draft.customer.name.trim().is_empty() {
                failures.push(FieldFailure::new(FieldId::CustomerName, "Enter your name."));
            }
            let phone = draft.customer.phone.trim();
            if phone.is_empty() {
                failures.push(FieldFailure::new(FieldId::Phone, "Enter a phone number."));
            } else if !PHONE_RE.is_match(phone) {
                failures.push(FieldFailure::new(
                    FieldId::Phone,
                    "Enter a valid phone number.",
                ));
            }
            if draft.is_required(FieldId::AddressType) && draft.address_type.is_none() {
                failures.push(FieldFailure::new(
                    FieldId::AddressType,
                    "Choose an address type.",
                ));
            }
            if draft.is_required(FieldId::Address) && draft.address.trim().is_empty() {
                failures.push(FieldFailure::new(
                    FieldId::Address,
                    "Enter the delivery address.",
                ));
            }
        }
        Step::AddOns => {
            if draft.is_required(FieldId::SetupOption) && draft.setup_option.is_none() {
                failures.push(FieldFailure::new(
                    FieldId::SetupOption,
                    "Choose a setup option.",
                ));
            }
        }
        Step::Review => {
            if draft.customer.signature.trim().is_empty() {
                failures.push(FieldFailure::new(
                    FieldId::Signature,
                    "Sign to confirm your booking.",
                ));
            }
            if !draft.agreements.trash {
                failures.push(FieldFailure::new(
                    FieldId::TrashAgreement,
                    "Please agree to remove all trash from the rentals.",
                ));
            }
            if !draft.agreements.folding {
                failures.push(FieldFailure::new(
                    FieldId::FoldingAgreement,
                    "Please agree to fold tables and stack chairs for return.",
                ));
            }
            if !draft.agreements.waiver {
                failures.push(FieldFailure::new(
                    FieldId::WaiverAgreement,
                    "Please accept the liability waiver.",
                ));
            }
        }
    }

    StepReport { failures }
}
