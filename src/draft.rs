//! Booking draft — the in-progress, not-yet-submitted form data.

use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::validate::{FieldId, required_fields_for};

/// Address sentinel used when the customer collects the items themselves.
pub const SELF_PICKUP_ADDRESS: &str = "Self Pickup";

/// How the rental reaches the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    /// We deliver, set up on request, and collect.
    Dropoff,
    /// The customer picks up and returns the items.
    Pickup,
}

impl std::fmt::Display for ServiceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Dropoff => "dropoff",
            Self::Pickup => "pickup",
        };
        write!(f, "{s}")
    }
}

/// Venue category for drop-off deliveries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressType {
    Residence,
    Business,
    Park,
    Other,
}

impl std::fmt::Display for AddressType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Residence => "residence",
            Self::Business => "business",
            Self::Park => "park",
            Self::Other => "other",
        };
        write!(f, "{s}")
    }
}

/// Optional setup service sold as an add-on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetupOption {
    None,
    Standard,
    Premium,
}

impl SetupOption {
    /// Flat fee charged for this option.
    pub fn fee(&self) -> Decimal {
        match self {
            Self::None => Decimal::ZERO,
            Self::Standard => dec!(20),
            Self::Premium => dec!(45),
        }
    }
}

impl std::fmt::Display for SetupOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::None => "none",
            Self::Standard => "standard",
            Self::Premium => "premium",
        };
        write!(f, "{s}")
    }
}

/// Rentable item kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Tables,
    Chairs,
}

/// Requested counts per item kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemQuantities {
    pub tables: u32,
    pub chairs: u32,
}

impl ItemQuantities {
    pub fn get(&self, kind: ItemKind) -> u32 {
        match kind {
            ItemKind::Tables => self.tables,
            ItemKind::Chairs => self.chairs,
        }
    }

    pub fn set(&mut self, kind: ItemKind, count: u32) {
        match kind {
            ItemKind::Tables => self.tables = count,
            ItemKind::Chairs => self.chairs = count,
        }
    }

    /// True when nothing has been requested yet.
    pub fn is_empty(&self) -> bool {
        self.tables == 0 && self.chairs == 0
    }

    /// Human-readable summary, e.g. "3 Tables, 12 Chairs".
    pub fn summary(&self) -> String {
        format!("{} Tables, {} Chairs", self.tables, self.chairs)
    }
}

/// Event date/time range. Pickup flows use only `start_date`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSchedule {
    pub start_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_date: Option<NaiveDate>,
    pub end_time: Option<NaiveTime>,
}

/// Customer contact details collected across the later steps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub name: String,
    pub phone: String,
    pub signature: String,
}

/// Checkbox agreements required before submission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agreements {
    pub trash: bool,
    pub folding: bool,
    pub waiver: bool,
}

/// Which agreement a view event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgreementKind {
    Trash,
    Folding,
    Waiver,
}

impl Agreements {
    pub fn set(&mut self, kind: AgreementKind, value: bool) {
        match kind {
            AgreementKind::Trash => self.trash = value,
            AgreementKind::Folding => self.folding = value,
            AgreementKind::Waiver => self.waiver = value,
        }
    }

    pub fn all_accepted(&self) -> bool {
        self.trash && self.folding && self.waiver
    }
}

/// The accumulated booking form data.
///
/// `required` is the *applied* required-field configuration: it is written
/// when the service-type step is left and later steps consult it instead of
/// re-deriving requiredness from the service type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingDraft {
    pub service_type: Option<ServiceType>,
    pub schedule: EventSchedule,
    pub items: ItemQuantities,
    pub customer: Customer,
    pub address_type: Option<AddressType>,
    pub address: String,
    pub setup_option: Option<SetupOption>,
    pub agreements: Agreements,
    pub required: BTreeSet<FieldId>,
}

impl Default for BookingDraft {
    fn default() -> Self {
        Self {
            service_type: None,
            schedule: EventSchedule::default(),
            items: ItemQuantities::default(),
            customer: Customer::default(),
            address_type: None,
            address: String::new(),
            setup_option: None,
            agreements: Agreements::default(),
            // Until a service type is chosen, validate against the stricter set.
            required: required_fields_for(ServiceType::Dropoff),
        }
    }
}

impl BookingDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconfigure the draft for the chosen service type.
    ///
    /// Pickup forces the setup option to `None`, drops the address
    /// requirement, and fills the address with the self-pickup sentinel.
    /// Drop-off restores the full requirements and clears the sentinel so a
    /// real address must be entered.
    pub fn apply_service_type(&mut self, service_type: ServiceType) {
        self.service_type = Some(service_type);
        self.required = required_fields_for(service_type);
        match service_type {
            ServiceType::Pickup => {
                self.setup_option = Some(SetupOption::None);
                self.address_type = None;
                self.address = SELF_PICKUP_ADDRESS.to_string();
            }
            ServiceType::Dropoff => {
                if self.setup_option == Some(SetupOption::None) {
                    self.setup_option = None;
                }
                if self.address == SELF_PICKUP_ADDRESS {
                    self.address.clear();
                }
            }
        }
    }

    /// Whether a field is required under the applied configuration.
    pub fn is_required(&self, field: FieldId) -> bool {
        self.required.contains(&field)
    }
}
