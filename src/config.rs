//! Configuration types.

use crate::draft::ServiceType;

/// Wizard configuration.
///
/// The flow comes in two variants: the full five-step flow with a
/// service-type pre-step, and a four-step flow where the service type is
/// fixed up front (single-service deployments embed the widget with the
/// type already decided).
#[derive(Debug, Clone)]
pub struct WizardConfig {
    /// Endpoint URL of the remote booking service.
    pub endpoint: String,
    /// Whether the flow starts with a service-type selection step.
    pub service_type_step: bool,
    /// Service type applied at construction when there is no pre-step.
    pub default_service_type: ServiceType,
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8000/booking".to_string(),
            service_type_step: true,
            default_service_type: ServiceType::Dropoff,
        }
    }
}
