//! Rental Booking — client-side booking wizard core.
//!
//! A finite-state wizard over a [`draft::BookingDraft`], gating forward
//! transitions on per-step validation and a remote availability check, with
//! a thin adapter to the booking service's JSON endpoint.

pub mod client;
pub mod config;
pub mod draft;
pub mod error;
pub mod quote;
pub mod validate;
pub mod wizard;
