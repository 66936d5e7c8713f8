pub mod catalog;
pub mod money;
pub mod payment;
pub mod query;
pub mod room;

pub use catalog::{RoomCatalog, RoomEntry};
pub use money::{MinorUnits, Quote};
pub use payment::{
    AttemptStatus, MobileMoneyProvider, PaymentAttempt, PaymentForm, PaymentMethod,
    TransactionStatus,
};
pub use query::BookingQuery;
pub use room::{derive_offers, Availability, RoomDetail, RoomOffer};
