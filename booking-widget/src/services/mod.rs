pub mod availability;
pub mod exchange_rate;
pub mod paystack;

pub use availability::{AvailabilitySource, ProxyClient};
pub use exchange_rate::{ExchangeRate, ExchangeRateApiClient, ExchangeRateCache, RateError, RateSource};
pub use paystack::{
    CardCheckout, GatewayError, MobileMoneyCharge, PaymentGateway, PaystackClient, Verification,
};
