//! Three-step booking wizard: query, room choice, payment.
//!
//! `BookingWidget` drives `WizardState` through its collaborators. Every
//! operation takes `&mut self`, so one call is in flight at a time. Failures
//! leave the wizard in the state it was in before the call and set a short
//! status message for the user.

mod state;

pub use state::{Event, SelectedRoom, Session, WizardState};

use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{WidgetSettings, DEFAULT_CUSTOMER_ID};
use crate::error::{BookingError, NO_ROOMS_AVAILABLE};
use crate::models::{
    derive_offers, AttemptStatus, BookingQuery, PaymentAttempt, PaymentForm, PaymentMethod,
    RoomCatalog, TransactionStatus,
};
use crate::services::{
    AvailabilitySource, ExchangeRateApiClient, ExchangeRateCache, PaymentGateway, PaystackClient,
    ProxyClient,
};

pub const CHECK_AVAILABILITY_FAILED: &str = "Failed to check availability. Please try again.";
pub const PAYMENT_INITIATED: &str =
    "Payment initiated. Please check your phone for the payment prompt.";
pub const PAYMENT_INITIATION_FAILED: &str = "Failed to initiate payment. Please try again.";
pub const PAYMENT_SUCCESSFUL: &str = "Payment successful!";
pub const PAYMENT_FAILED: &str = "Payment failed. Please try again.";
pub const PAYMENT_STILL_PENDING: &str =
    "Payment is still pending. Please check your phone and try again.";
pub const VERIFICATION_FAILED: &str = "Error verifying payment. Please try again.";
pub const GENERIC_ERROR: &str = "An error occurred. Please try again.";

/// Source of "today" for date validation.
pub type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

#[derive(Debug, Clone)]
pub struct WidgetOptions {
    pub customer_id: i64,
    pub close_delay: Duration,
    /// Restrict queries to these apartments; empty means all.
    pub apartment_ids: Vec<i64>,
}

impl Default for WidgetOptions {
    fn default() -> Self {
        Self {
            customer_id: DEFAULT_CUSTOMER_ID,
            close_delay: Duration::from_secs(2),
            apartment_ids: Vec::new(),
        }
    }
}

impl WidgetOptions {
    pub fn from_settings(settings: &WidgetSettings) -> Self {
        Self {
            customer_id: settings.proxy.customer_id,
            close_delay: settings.close_delay(),
            apartment_ids: settings.proxy.apartment_ids.clone(),
        }
    }
}

pub struct BookingWidget {
    availability: Arc<dyn AvailabilitySource>,
    gateway: Arc<dyn PaymentGateway>,
    rates: Arc<ExchangeRateCache>,
    catalog: Arc<RoomCatalog>,
    options: WidgetOptions,
    clock: Clock,
    state: WizardState,
    status: Option<String>,
}

impl BookingWidget {
    pub fn new(
        availability: Arc<dyn AvailabilitySource>,
        gateway: Arc<dyn PaymentGateway>,
        rates: Arc<ExchangeRateCache>,
        catalog: Arc<RoomCatalog>,
        options: WidgetOptions,
    ) -> Self {
        Self {
            availability,
            gateway,
            rates,
            catalog,
            options,
            clock: Arc::new(|| chrono::Local::now().date_naive()),
            state: WizardState::AwaitingQuery,
            status: None,
        }
    }

    /// Wire the production clients from loaded settings. The rate cache starts
    /// on the fallback and refreshes lazily.
    pub fn from_settings(settings: &WidgetSettings) -> Result<Self, BookingError> {
        let availability = ProxyClient::new(&settings.proxy.base_url)?;
        let gateway = PaystackClient::new(&settings.paystack)?;
        let source = ExchangeRateApiClient::new(&settings.exchange_rate)?;
        let rates = ExchangeRateCache::from_settings(Arc::new(source), &settings.exchange_rate);

        Ok(Self::new(
            Arc::new(availability),
            Arc::new(gateway),
            rates,
            Arc::new(settings.catalog()?),
            WidgetOptions::from_settings(settings),
        ))
    }

    pub fn with_clock(mut self, clock: impl Fn() -> NaiveDate + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    /// Message for the user about the last operation, if any.
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Step one. Validates locally, then asks the proxy which rooms are free.
    pub async fn submit_query(
        &mut self,
        arrival: NaiveDate,
        departure: NaiveDate,
    ) -> Result<(), BookingError> {
        const OP: &str = "submit a query";
        if !matches!(
            self.state,
            WizardState::AwaitingQuery | WizardState::RoomsListed(_)
        ) {
            return Err(self.invalid(OP));
        }

        let today = (self.clock)();
        let query = match BookingQuery::new(arrival, departure, self.options.customer_id, today) {
            Ok(query) => query.with_apartments(self.options.apartment_ids.clone()),
            Err(e) => return Err(self.fail(e, GENERIC_ERROR)),
        };

        tracing::debug!(
            arrival = %query.arrival_date,
            departure = %query.departure_date,
            nights = query.nights(),
            "Checking availability"
        );

        let availability = match self.availability.check_availability(&query).await {
            Ok(availability) => availability,
            Err(e) => return Err(self.fail(e, CHECK_AVAILABILITY_FAILED)),
        };

        let offers = derive_offers(&availability, &self.catalog);
        if offers.is_empty() {
            tracing::info!(
                available = availability.available_apartments.len(),
                "No priced rooms for query"
            );
            self.transition(Event::NoRooms)?;
            self.status = Some(NO_ROOMS_AVAILABLE.to_string());
            return Err(BookingError::NoRoomsAvailable);
        }

        tracing::info!(rooms = offers.len(), "Rooms listed");
        self.status = None;
        self.transition(Event::RoomsFound(Session { query, offers }))
    }

    /// Fetch details for every listed room that has none yet. Per-room
    /// failures are logged and skipped. Returns how many were loaded.
    pub async fn load_room_details(&mut self) -> Result<usize, BookingError> {
        let ids: Vec<i64> = match &self.state {
            WizardState::RoomsListed(session) => session
                .offers
                .iter()
                .filter(|offer| offer.detail.is_none())
                .map(|offer| offer.id)
                .collect(),
            _ => return Err(self.invalid("load room details")),
        };

        let mut loaded = Vec::with_capacity(ids.len());
        for id in ids {
            match self.availability.room_details(id).await {
                Ok(detail) => loaded.push((id, detail)),
                Err(e) => tracing::warn!(apartment_id = id, error = %e, "Room details unavailable"),
            }
        }

        let count = loaded.len();
        if let WizardState::RoomsListed(session) = &mut self.state {
            for (id, detail) in loaded {
                if let Some(offer) = session.offers.iter_mut().find(|o| o.id == id) {
                    offer.detail = Some(detail);
                }
            }
        }
        Ok(count)
    }

    /// Step two. Prices the room at the cached exchange rate.
    pub async fn select_room(&mut self, room_id: i64) -> Result<(), BookingError> {
        let offer = match &self.state {
            WizardState::RoomsListed(session) => {
                session.offers.iter().find(|o| o.id == room_id).cloned()
            }
            _ => return Err(self.invalid("select a room")),
        };
        let Some(offer) = offer else {
            return Err(self.fail(
                BookingError::Validation("Please select an available room.".to_string()),
                GENERIC_ERROR,
            ));
        };

        let quote = match self.rates.convert_usd(offer.nightly_price_usd).await {
            Ok(quote) => quote,
            Err(e) => return Err(self.fail(e, GENERIC_ERROR)),
        };

        tracing::info!(
            room_id,
            usd = quote.usd,
            rate = quote.rate,
            local = %quote.local,
            "Room selected"
        );
        self.status = None;
        self.transition(Event::RoomSelected(SelectedRoom { offer, quote }))
    }

    pub fn back(&mut self) -> Result<(), BookingError> {
        self.transition(Event::Back)?;
        self.status = None;
        Ok(())
    }

    /// Step three. Mobile money waits for verification; card hands off to the
    /// gateway's hosted page.
    pub async fn submit_payment(&mut self, form: PaymentForm) -> Result<(), BookingError> {
        let amount = match &self.state {
            WizardState::PaymentPending { selected, .. } => selected.quote.local,
            _ => return Err(self.invalid("submit a payment")),
        };

        if let Err(e) = form.check() {
            return Err(self.fail(e, GENERIC_ERROR));
        }

        match &form.method {
            PaymentMethod::MobileMoney { phone, provider } => {
                tracing::info!(
                    provider = provider.label(),
                    amount = %amount,
                    "Charging mobile money"
                );
                let charge = match self
                    .gateway
                    .charge_mobile_money(&form.email, amount, phone, *provider)
                    .await
                {
                    Ok(charge) => charge,
                    Err(e) => return Err(self.fail(e.into(), PAYMENT_INITIATION_FAILED)),
                };

                let attempt = PaymentAttempt {
                    email: form.email.clone(),
                    method: form.method.clone(),
                    amount,
                    reference: charge.reference,
                    status: AttemptStatus::Pending,
                };
                self.transition(Event::ChargeAccepted(attempt))?;
                self.status = Some(PAYMENT_INITIATED.to_string());
                Ok(())
            }
            PaymentMethod::Card => {
                let checkout = match self
                    .gateway
                    .initialize_card_payment(&form.email, amount)
                    .await
                {
                    Ok(checkout) => checkout,
                    Err(e) => return Err(self.fail(e.into(), PAYMENT_INITIATION_FAILED)),
                };

                self.status = None;
                self.transition(Event::CheckoutCreated {
                    authorization_url: checkout.authorization_url,
                    reference: checkout.reference,
                })
            }
        }
    }

    /// Ask the gateway about the stored reference. Success closes the wizard
    /// after the close delay.
    pub async fn verify(&mut self) -> Result<TransactionStatus, BookingError> {
        let reference = match &self.state {
            WizardState::AwaitingVerification { attempt, .. }
            | WizardState::PaymentVerifying { attempt, .. } => attempt.reference.clone(),
            _ => return Err(self.invalid("verify a payment")),
        };

        self.transition(Event::VerificationStarted)?;

        let verification = match self.gateway.verify(&reference).await {
            Ok(verification) => verification,
            Err(e) => {
                self.transition(Event::VerificationAborted)?;
                return Err(self.fail(e.into(), VERIFICATION_FAILED));
            }
        };

        let status = verification.status.clone();
        let message = match &status {
            TransactionStatus::Success => PAYMENT_SUCCESSFUL,
            TransactionStatus::Failed => PAYMENT_FAILED,
            TransactionStatus::Pending(_) => PAYMENT_STILL_PENDING,
        };
        tracing::info!(reference = %reference, status = ?status, "Verification finished");

        self.transition(Event::VerificationFinished(status.clone()))?;
        self.status = Some(message.to_string());

        if status == TransactionStatus::Success {
            tokio::time::sleep(self.options.close_delay).await;
            self.transition(Event::CloseDelayElapsed)?;
        }
        Ok(status)
    }

    /// Close from any state, discarding the session.
    pub fn close(&mut self) {
        self.state = WizardState::Closed;
        self.status = None;
    }

    /// Reopen a closed or redirected wizard at step one.
    pub fn open(&mut self) -> Result<(), BookingError> {
        self.transition(Event::Open)?;
        self.status = None;
        Ok(())
    }

    fn transition(&mut self, event: Event) -> Result<(), BookingError> {
        let current = std::mem::replace(&mut self.state, WizardState::Closed);
        match current.apply(event) {
            Ok(next) => {
                self.state = next;
                Ok(())
            }
            Err((previous, error)) => {
                self.state = previous;
                Err(error)
            }
        }
    }

    fn invalid(&self, operation: &'static str) -> BookingError {
        BookingError::InvalidTransition {
            operation,
            state: self.state.name(),
        }
    }

    fn fail(&mut self, error: BookingError, fallback: &str) -> BookingError {
        tracing::warn!(error = %error, state = self.state.name(), "Booking step failed");
        self.status = Some(error.user_message_or(fallback));
        error
    }
}
