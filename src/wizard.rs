//! Booking wizard — the multi-step state machine behind the widget.
//!
//! The wizard owns the draft and all flow state; the view layer only
//! translates raw input events into [`Intent`]s and applies the returned
//! [`RenderState`]. Every forward transition is gated on validation, the
//! availability step is additionally gated on a fresh successful remote
//! check, and all remote-call failures are recovered here and rendered as
//! status text.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::client::{
    AvailabilityQuery, AvailabilityResult, BookingApi, BookingConfirmation, HttpBookingClient,
};
use crate::config::WizardConfig;
use crate::draft::{
    AddressType, AgreementKind, BookingDraft, ItemKind, ServiceType, SetupOption,
};
use crate::error::WizardError;
use crate::quote::{BaseQuote, Quote, format_money, resolve_setup_fee};
use crate::validate::{FieldFailure, validate_step};

/// Steps of the booking flow, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    ServiceType,
    Availability,
    EventDetails,
    AddOns,
    Review,
}

const FIVE_STEP_FLOW: [Step; 5] = [
    Step::ServiceType,
    Step::Availability,
    Step::EventDetails,
    Step::AddOns,
    Step::Review,
];

const FOUR_STEP_FLOW: [Step; 4] = [
    Step::Availability,
    Step::EventDetails,
    Step::AddOns,
    Step::Review,
];

impl Step {
    fn sequence(config: &WizardConfig) -> &'static [Step] {
        if config.service_type_step {
            &FIVE_STEP_FLOW
        } else {
            &FOUR_STEP_FLOW
        }
    }

    /// First step of the configured flow.
    pub fn first(config: &WizardConfig) -> Step {
        Step::sequence(config)[0]
    }

    /// Next step, or `None` at the terminal form step.
    pub fn next(self, config: &WizardConfig) -> Option<Step> {
        let seq = Step::sequence(config);
        let pos = seq.iter().position(|s| *s == self)?;
        seq.get(pos + 1).copied()
    }

    /// Previous step, or `None` at the first step.
    pub fn prev(self, config: &WizardConfig) -> Option<Step> {
        let seq = Step::sequence(config);
        let pos = seq.iter().position(|s| *s == self)?;
        pos.checked_sub(1).map(|p| seq[p])
    }

    /// 1-based position within the configured flow.
    pub fn index(self, config: &WizardConfig) -> usize {
        Step::sequence(config)
            .iter()
            .position(|s| *s == self)
            .map(|p| p + 1)
            .unwrap_or(1)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::ServiceType => "service_type",
            Self::Availability => "availability",
            Self::EventDetails => "event_details",
            Self::AddOns => "add_ons",
            Self::Review => "review",
        }
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Where the flow currently is: a form step, or the confirmed display.
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    InProgress(Step),
    Confirmed(BookingConfirmation),
}

/// A single typed edit reported by the view.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldEdit {
    ServiceType(ServiceType),
    StartDate(NaiveDate),
    StartTime(NaiveTime),
    EndDate(NaiveDate),
    EndTime(NaiveTime),
    Quantity(ItemKind, u32),
    CustomerName(String),
    Phone(String),
    AddressType(AddressType),
    Address(String),
    SetupOption(SetupOption),
    Agreement(AgreementKind, bool),
    Signature(String),
}

/// The closed set of user intents the view can dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    NextStep,
    PrevStep,
    CheckAvailability,
    Submit,
    Reset,
    FieldChanged(FieldEdit),
}

/// Kind of status line shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    Info,
    Success,
    ValidationFailure,
    Unavailable,
    TransportError,
    BookingConflict,
}

/// Status message for the view's banner area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusLine {
    pub kind: StatusKind,
    pub text: String,
}

impl StatusLine {
    fn new(kind: StatusKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// Display strings for the server quote shown on the availability step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BaseQuoteDisplay {
    pub items: String,
    pub total: String,
    /// Present only when the bundle discount applies.
    pub discount: Option<String>,
}

/// Display strings for the final quote shown at add-ons/review.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalQuoteDisplay {
    pub add_on_fee: String,
    pub total: String,
    pub deposit: String,
}

/// Display strings for the confirmed-booking panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfirmationDisplay {
    pub booking_id: String,
    /// Echoed event date, e.g. "Friday, June 5".
    pub date: Option<String>,
    pub deposit: Option<String>,
}

/// Everything the view needs to draw the widget.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderState {
    /// 1-based step position, absent once confirmed.
    pub step_index: Option<usize>,
    pub total_steps: usize,
    pub step_name: Option<&'static str>,
    pub busy: bool,
    pub status: Option<StatusLine>,
    pub failures: Vec<FieldFailure>,
    pub base_quote: Option<BaseQuoteDisplay>,
    pub final_quote: Option<FinalQuoteDisplay>,
    /// Server-reported shortfall reasons from the last check, in order.
    pub availability_reasons: Vec<String>,
    pub confirmation: Option<ConfirmationDisplay>,
}

/// All mutable flow state, reset as one value.
#[derive(Debug, Clone, PartialEq)]
pub struct WizardState {
    pub stage: Stage,
    pub draft: BookingDraft,
    pub cached_base_quote: Option<BaseQuote>,
    pub last_availability: Option<AvailabilityResult>,
    /// Query the last availability result was obtained for.
    pub availability_for: Option<AvailabilityQuery>,
    pub final_quote: Option<Quote>,
    pub busy: bool,
    pub status: Option<StatusLine>,
    pub failures: Vec<FieldFailure>,
}

impl WizardState {
    fn new(config: &WizardConfig) -> Self {
        let mut draft = BookingDraft::new();
        if !config.service_type_step {
            draft.apply_service_type(config.default_service_type);
        }
        Self {
            stage: Stage::InProgress(Step::first(config)),
            draft,
            cached_base_quote: None,
            last_availability: None,
            availability_for: None,
            final_quote: None,
            busy: false,
            status: None,
            failures: Vec::new(),
        }
    }
}

/// The booking wizard controller.
pub struct BookingWizard<A: BookingApi> {
    config: WizardConfig,
    api: A,
    state: WizardState,
}

impl BookingWizard<HttpBookingClient> {
    /// Build a wizard backed by the HTTP client at `config.endpoint`.
    pub fn from_config(config: WizardConfig) -> Self {
        let api = HttpBookingClient::new(config.endpoint.clone());
        Self::new(config, api)
    }
}

impl<A: BookingApi> BookingWizard<A> {
    pub fn new(config: WizardConfig, api: A) -> Self {
        let state = WizardState::new(&config);
        Self { config, api, state }
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    /// Dispatch one user intent and return the updated render state.
    ///
    /// Errors never escape: transition and remote faults are recovered into
    /// the status line. Intents arriving while a remote call is in flight
    /// are dropped (the triggering control is disabled view-side; this is
    /// the backstop).
    pub async fn handle(&mut self, intent: Intent) -> RenderState {
        if self.state.busy {
            tracing::warn!("Ignoring intent while a remote call is in flight");
            return self.render();
        }
        let result = match intent {
            Intent::NextStep => self.advance(),
            Intent::PrevStep => self.retreat(),
            Intent::CheckAvailability => self.check_availability().await,
            Intent::Submit => self.submit().await,
            Intent::Reset => {
                self.reset();
                Ok(())
            }
            Intent::FieldChanged(edit) => {
                self.apply_edit(edit);
                Ok(())
            }
        };
        if let Err(err) = result {
            self.recover(err);
        }
        self.render()
    }

    /// Return to the initial state, discarding the draft and all caches.
    pub fn reset(&mut self) {
        tracing::info!("Wizard reset");
        self.state = WizardState::new(&self.config);
    }

    fn current_step(&self) -> Result<Step, WizardError> {
        match self.state.stage {
            Stage::InProgress(step) => Ok(step),
            Stage::Confirmed(_) => Err(WizardError::AlreadyConfirmed),
        }
    }

    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }

    /// Run step validation, storing failures. Returns whether it passed.
    fn validate_current(&mut self, step: Step) -> bool {
        let report = validate_step(step, &self.state.draft, self.today());
        if report.is_valid() {
            self.state.failures.clear();
            true
        } else {
            tracing::debug!(step = %step, failures = report.failures.len(), "Validation failed");
            self.state.status = Some(StatusLine::new(
                StatusKind::ValidationFailure,
                "Please fix the highlighted fields.",
            ));
            self.state.failures = report.failures;
            false
        }
    }

    /// Whether a successful check exists for the current date/quantities.
    fn availability_confirmed(&self) -> bool {
        matches!(
            self.state.last_availability,
            Some(AvailabilityResult::Available { .. })
        ) && self.state.availability_for == AvailabilityQuery::from_draft(&self.state.draft)
    }

    fn advance(&mut self) -> Result<(), WizardError> {
        let step = self.current_step()?;
        if !self.validate_current(step) {
            return Ok(());
        }
        match step {
            Step::ServiceType => {
                // Validation guarantees a selection; reconfigure downstream
                // requiredness once, here, so later steps re-apply it.
                if let Some(service_type) = self.state.draft.service_type {
                    self.state.draft.apply_service_type(service_type);
                }
            }
            Step::Availability => {
                if !self.availability_confirmed() {
                    return Err(WizardError::AvailabilityRequired);
                }
            }
            Step::AddOns => {
                let base_total = self
                    .state
                    .cached_base_quote
                    .as_ref()
                    .map(|q| q.total_price)
                    .ok_or(WizardError::AvailabilityRequired)?;
                let fee = resolve_setup_fee(self.state.draft.setup_option);
                self.state.final_quote = Some(Quote::compute(base_total, fee));
            }
            Step::EventDetails | Step::Review => {}
        }
        match step.next(&self.config) {
            Some(next) => {
                tracing::info!(from = %step, to = %next, "Advancing");
                self.state.stage = Stage::InProgress(next);
                self.state.status = None;
            }
            None => {
                self.state.status = Some(StatusLine::new(
                    StatusKind::Info,
                    "Review your booking and submit.",
                ));
            }
        }
        Ok(())
    }

    fn retreat(&mut self) -> Result<(), WizardError> {
        let step = self.current_step()?;
        if let Some(prev) = step.prev(&self.config) {
            tracing::info!(from = %step, to = %prev, "Retreating");
            self.state.stage = Stage::InProgress(prev);
            self.state.status = None;
            self.state.failures.clear();
        }
        Ok(())
    }

    async fn check_availability(&mut self) -> Result<(), WizardError> {
        let step = self.current_step()?;
        if step != Step::Availability {
            return Err(WizardError::WrongStep {
                intent: "check_availability",
                step: step.name(),
            });
        }
        if !self.validate_current(step) {
            return Ok(());
        }
        let Some(query) = AvailabilityQuery::from_draft(&self.state.draft) else {
            return Ok(());
        };

        self.state.busy = true;
        let outcome = self.api.check_availability(&query).await;
        self.state.busy = false;

        match outcome {
            Ok(AvailabilityResult::Available { quote }) => {
                tracing::info!(total = %quote.total_price, "Items available");
                self.state.cached_base_quote = Some(quote.clone());
                self.state.last_availability = Some(AvailabilityResult::Available { quote });
                self.state.availability_for = Some(query);
                self.state.status =
                    Some(StatusLine::new(StatusKind::Success, "Items available!"));
            }
            Ok(AvailabilityResult::Unavailable { reasons }) => {
                tracing::info!(reasons = reasons.len(), "Items unavailable");
                self.state.cached_base_quote = None;
                self.state.last_availability =
                    Some(AvailabilityResult::Unavailable { reasons });
                self.state.availability_for = Some(query);
                self.state.status = Some(StatusLine::new(
                    StatusKind::Unavailable,
                    "Not enough inventory for the requested items.",
                ));
            }
            Err(err) => {
                tracing::warn!(error = %err, "Availability check failed");
                self.state.status = Some(StatusLine::new(
                    StatusKind::TransportError,
                    "Could not reach the booking service. Please try again.",
                ));
            }
        }
        Ok(())
    }

    async fn submit(&mut self) -> Result<(), WizardError> {
        let step = self.current_step()?;
        if step != Step::Review {
            return Err(WizardError::WrongStep {
                intent: "submit",
                step: step.name(),
            });
        }
        if !self.validate_current(step) {
            return Ok(());
        }

        self.state.busy = true;
        let outcome = self.api.book(&self.state.draft).await;
        self.state.busy = false;

        match outcome {
            Ok(mut confirmation) => {
                confirmation.deposit = self.state.final_quote.map(|q| q.deposit);
                tracing::info!(booking_id = %confirmation.booking_id, "Booking confirmed");
                self.state.stage = Stage::Confirmed(confirmation);
                self.state.status =
                    Some(StatusLine::new(StatusKind::Success, "Booking confirmed!"));
            }
            Err(crate::error::ClientError::Rejected { message }) => {
                tracing::warn!(message = %message, "Booking rejected by server");
                self.state.status = Some(StatusLine::new(StatusKind::BookingConflict, message));
            }
            Err(err) => {
                tracing::warn!(error = %err, "Booking submission failed");
                self.state.status = Some(StatusLine::new(
                    StatusKind::TransportError,
                    "Could not reach the booking service. Please try again.",
                ));
            }
        }
        Ok(())
    }

    fn apply_edit(&mut self, edit: FieldEdit) {
        let draft = &mut self.state.draft;
        let mut invalidates = false;
        match edit {
            FieldEdit::ServiceType(st) => draft.service_type = Some(st),
            FieldEdit::StartDate(d) => {
                draft.schedule.start_date = Some(d);
                invalidates = true;
            }
            FieldEdit::StartTime(t) => {
                draft.schedule.start_time = Some(t);
                invalidates = true;
            }
            FieldEdit::EndDate(d) => {
                draft.schedule.end_date = Some(d);
                invalidates = true;
            }
            FieldEdit::EndTime(t) => {
                draft.schedule.end_time = Some(t);
                invalidates = true;
            }
            FieldEdit::Quantity(kind, count) => {
                draft.items.set(kind, count);
                invalidates = true;
            }
            FieldEdit::CustomerName(name) => draft.customer.name = name,
            FieldEdit::Phone(phone) => draft.customer.phone = phone,
            FieldEdit::AddressType(at) => draft.address_type = Some(at),
            FieldEdit::Address(address) => draft.address = address,
            FieldEdit::SetupOption(option) => draft.setup_option = Some(option),
            FieldEdit::Agreement(kind, value) => draft.agreements.set(kind, value),
            FieldEdit::Signature(signature) => draft.customer.signature = signature,
        }
        if invalidates {
            self.invalidate_availability();
        }
    }

    /// Editing quantities or dates makes any prior check stale: drop the
    /// cached results so the availability step must be passed again.
    fn invalidate_availability(&mut self) {
        if self.state.last_availability.is_some() || self.state.cached_base_quote.is_some() {
            tracing::debug!("Availability cache invalidated by edit");
        }
        self.state.last_availability = None;
        self.state.availability_for = None;
        self.state.cached_base_quote = None;
        self.state.final_quote = None;
    }

    fn recover(&mut self, err: WizardError) {
        tracing::debug!(error = %err, "Recovered wizard error");
        let kind = match err {
            WizardError::AvailabilityRequired => StatusKind::ValidationFailure,
            _ => StatusKind::Info,
        };
        self.state.status = Some(StatusLine::new(kind, err.to_string()));
    }

    /// Build the view model for the current state.
    pub fn render(&self) -> RenderState {
        let (step_index, step_name) = match self.state.stage {
            Stage::InProgress(step) => {
                (Some(step.index(&self.config)), Some(step.name()))
            }
            Stage::Confirmed(_) => (None, None),
        };

        let base_quote = self.state.cached_base_quote.as_ref().map(|q| BaseQuoteDisplay {
            items: self.state.draft.items.summary(),
            total: format_money(q.total_price),
            discount: q
                .discount_visible()
                .then(|| q.discount_applied.map(format_money))
                .flatten(),
        });

        let final_quote = self.state.final_quote.map(|q| FinalQuoteDisplay {
            add_on_fee: format_money(q.add_on_fee),
            total: q.total_display(),
            deposit: q.deposit_display(),
        });

        let availability_reasons = match &self.state.last_availability {
            Some(AvailabilityResult::Unavailable { reasons }) => reasons.clone(),
            _ => Vec::new(),
        };

        let confirmation = match &self.state.stage {
            Stage::Confirmed(c) => Some(ConfirmationDisplay {
                booking_id: c.booking_id.clone(),
                date: c.event_date.map(|d| d.format("%A, %B %-d").to_string()),
                deposit: c.deposit.map(format_money),
            }),
            Stage::InProgress(_) => None,
        };

        RenderState {
            step_index,
            total_steps: Step::sequence(&self.config).len(),
            step_name,
            busy: self.state.busy,
            status: self.state.status.clone(),
            failures: self.state.failures.clone(),
            base_quote,
            final_quote,
            availability_reasons,
            confirmation,
        }
    }
}
