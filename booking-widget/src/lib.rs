//! booking-widget: the three-step booking wizard (availability, room choice,
//! payment) and the clients it drives.
//!
//! The wizard talks to the availability proxy for rooms, to Paystack for
//! payments and to an exchange-rate API for the USD to local-currency quote.
//! Every collaborator sits behind a trait so a UI layer (or a test) can wire
//! in its own implementation.

pub mod callback;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod wizard;

pub use error::BookingError;
pub use wizard::{BookingWidget, WizardState};
