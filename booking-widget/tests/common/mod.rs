#![allow(dead_code)]

use async_trait::async_trait;
use booking_widget::config::PaystackSettings;
use booking_widget::models::{
    Availability, BookingQuery, MinorUnits, MobileMoneyProvider, RoomCatalog, RoomDetail,
    RoomEntry, TransactionStatus,
};
use booking_widget::services::{
    AvailabilitySource, CardCheckout, ExchangeRateCache, GatewayError, MobileMoneyCharge,
    PaymentGateway, PaystackClient, ProxyClient, RateError, RateSource, Verification,
};
use booking_widget::wizard::WidgetOptions;
use booking_widget::{BookingError, BookingWidget};
use chrono::NaiveDate;
use secrecy::Secret;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::MockServer;

pub const TEST_SECRET: &str = "sk_test_widget";
pub const TEST_EMAIL: &str = "guest@example.com";
pub const TEST_PHONE: &str = "0551234987";
pub const TEST_RATE: f64 = 14.3;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn today() -> NaiveDate {
    date(2025, 3, 1)
}

pub fn catalog() -> RoomCatalog {
    RoomCatalog::new(vec![
        RoomEntry {
            id: 2634263,
            name: "Room 1".to_string(),
            image: Some("/images/rooms/StandardRoom.jpg".to_string()),
            base_price_usd: Some(35.0),
        },
        RoomEntry {
            id: 2644078,
            name: "Room 3".to_string(),
            image: Some("/images/rooms/DeluxeRoom.jpg".to_string()),
            base_price_usd: Some(40.0),
        },
    ])
    .unwrap()
}

pub fn paystack_settings(base_url: &str) -> PaystackSettings {
    PaystackSettings {
        secret_key: Secret::new(TEST_SECRET.to_string()),
        base_url: base_url.to_string(),
        callback_url: Some("http://localhost:5173/payment/callback".to_string()),
        currency: None,
    }
}

pub fn fixed_rates() -> Arc<ExchangeRateCache> {
    ExchangeRateCache::new(
        Arc::new(FixedRate(TEST_RATE)),
        TEST_RATE,
        Duration::from_secs(3600),
    )
}

pub fn options(close_delay: Duration) -> WidgetOptions {
    WidgetOptions {
        close_delay,
        ..WidgetOptions::default()
    }
}

/// Widget wired to real clients that talk to mock upstreams.
pub struct TestWidget {
    pub widget: BookingWidget,
    pub proxy: MockServer,
    pub paystack: MockServer,
}

impl TestWidget {
    pub async fn spawn() -> Self {
        Self::spawn_with(options(Duration::from_millis(20))).await
    }

    pub async fn spawn_with(options: WidgetOptions) -> Self {
        let proxy = MockServer::start().await;
        let paystack = MockServer::start().await;

        let widget = BookingWidget::new(
            Arc::new(ProxyClient::new(&proxy.uri()).unwrap()),
            Arc::new(PaystackClient::new(&paystack_settings(&paystack.uri())).unwrap()),
            fixed_rates(),
            Arc::new(catalog()),
            options,
        )
        .with_clock(today);

        Self {
            widget,
            proxy,
            paystack,
        }
    }
}

pub struct FixedRate(pub f64);

#[async_trait]
impl RateSource for FixedRate {
    async fn fetch_rate(&self) -> Result<f64, RateError> {
        Ok(self.0)
    }
}

/// Replays scripted results, then keeps failing with 503.
#[derive(Default)]
pub struct ScriptedRates {
    results: Mutex<VecDeque<Result<f64, u16>>>,
    pub calls: AtomicUsize,
}

impl ScriptedRates {
    pub fn new(results: Vec<Result<f64, u16>>) -> Arc<Self> {
        Arc::new(Self {
            results: Mutex::new(results.into()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RateSource for ScriptedRates {
    async fn fetch_rate(&self) -> Result<f64, RateError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.results.lock().unwrap().pop_front().unwrap_or(Err(503));
        next.map_err(RateError::Status)
    }
}

/// In-memory availability with a fixed answer.
pub struct StaticAvailability {
    pub availability: Availability,
    pub calls: AtomicUsize,
}

impl StaticAvailability {
    pub fn new(body: &str) -> Arc<Self> {
        Arc::new(Self {
            availability: Availability::from_json(body).unwrap(),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl AvailabilitySource for StaticAvailability {
    async fn check_availability(&self, _query: &BookingQuery) -> Result<Availability, BookingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.availability.clone())
    }

    async fn room_details(&self, _apartment_id: i64) -> Result<RoomDetail, BookingError> {
        Ok(RoomDetail::default())
    }
}

/// Accepts every charge as `r1` and answers verification from a script.
pub struct ScriptedGateway {
    statuses: Mutex<VecDeque<TransactionStatus>>,
    pub verify_calls: AtomicUsize,
}

impl ScriptedGateway {
    pub fn new(statuses: Vec<TransactionStatus>) -> Arc<Self> {
        Arc::new(Self {
            statuses: Mutex::new(statuses.into()),
            verify_calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
    async fn charge_mobile_money(
        &self,
        _email: &str,
        _amount: MinorUnits,
        _phone: &str,
        _provider: MobileMoneyProvider,
    ) -> Result<MobileMoneyCharge, GatewayError> {
        Ok(MobileMoneyCharge {
            reference: "r1".to_string(),
            status: "send_otp".to_string(),
            message: "Charge attempted".to_string(),
            display_text: None,
        })
    }

    async fn initialize_card_payment(
        &self,
        _email: &str,
        _amount: MinorUnits,
    ) -> Result<CardCheckout, GatewayError> {
        Ok(CardCheckout {
            authorization_url: "https://checkout.paystack.com/abc".to_string(),
            reference: "r1".to_string(),
            access_code: None,
        })
    }

    async fn verify(&self, reference: &str) -> Result<Verification, GatewayError> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        let status = self
            .statuses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| GatewayError::Mismatch("no scripted status".to_string()))?;
        Ok(Verification {
            reference: reference.to_string(),
            status,
            amount: MinorUnits(50050),
            currency: Some("GHS".to_string()),
            gateway_response: None,
        })
    }
}
