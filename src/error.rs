//! Error types for the booking wizard.

/// Top-level error type for the crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Booking service error: {0}")]
    Client(#[from] ClientError),

    #[error("Wizard error: {0}")]
    Wizard(#[from] WizardError),
}

/// Errors from the remote booking service adapter.
///
/// `Transport` and `InvalidResponse` are faults; `Rejected` is a business
/// outcome (the server refused the booking, e.g. the inventory race was
/// lost between check and submit) and carries the server's message when
/// one was supplied.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Invalid response from booking service: {0}")]
    InvalidResponse(String),

    #[error("Booking rejected: {message}")]
    Rejected { message: String },
}

/// Errors raised by wizard transitions.
///
/// These never escape `BookingWizard::handle` — they are recovered at the
/// wizard boundary and rendered as status text.
#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    #[error("Intent {intent} is not valid on step {step}")]
    WrongStep {
        intent: &'static str,
        step: &'static str,
    },

    #[error("A remote call is already in flight")]
    CallInFlight,

    #[error("Availability must be checked for the current date and quantities before continuing")]
    AvailabilityRequired,

    #[error("The booking is already confirmed; reset to start over")]
    AlreadyConfirmed,
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;
