mod common;

use booking_widget::models::{MinorUnits, MobileMoneyProvider, TransactionStatus};
use booking_widget::services::{GatewayError, PaymentGateway, PaystackClient};
use booking_widget::BookingError;
use common::{paystack_settings, TEST_EMAIL, TEST_PHONE, TEST_SECRET};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn client() -> (PaystackClient, MockServer) {
    let server = MockServer::start().await;
    let client = PaystackClient::new(&paystack_settings(&server.uri())).unwrap();
    (client, server)
}

#[tokio::test]
async fn charge_sends_bearer_key_and_minor_units() {
    let (client, server) = client().await;

    Mock::given(method("POST"))
        .and(path("/charge"))
        .and(header("authorization", format!("Bearer {TEST_SECRET}").as_str()))
        .and(body_json(json!({
            "email": TEST_EMAIL,
            "amount": 42900,
            "mobile_money": { "phone": TEST_PHONE, "provider": "vod" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": true,
            "message": "Charge attempted",
            "data": {
                "reference": "r1",
                "status": "pay_offline",
                "display_text": "Please complete authorization process on your mobile number"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let charge = client
        .charge_mobile_money(TEST_EMAIL, MinorUnits(42900), TEST_PHONE, MobileMoneyProvider::Vod)
        .await
        .unwrap();

    assert_eq!(charge.reference, "r1");
    assert_eq!(charge.status, "pay_offline");
    assert_eq!(charge.message, "Charge attempted");
    assert!(charge.display_text.is_some());
}

#[tokio::test]
async fn non_2xx_carries_gateway_message() {
    let (client, server) = client().await;

    Mock::given(method("POST"))
        .and(path("/charge"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "status": false,
            "message": "Invalid phone number"
        })))
        .mount(&server)
        .await;

    let err = client
        .charge_mobile_money(TEST_EMAIL, MinorUnits(100), "123", MobileMoneyProvider::Mtn)
        .await
        .unwrap_err();

    match err {
        GatewayError::Upstream { status, ref message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "Invalid phone number");
        }
        _ => panic!("unexpected error: {err:?}"),
    }
    assert_eq!(BookingError::from(err).user_message(), "Invalid phone number");
}

#[tokio::test]
async fn missing_fields_are_a_mismatch() {
    let (client, server) = client().await;

    Mock::given(method("POST"))
        .and(path("/transaction/initialize"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": true,
            "message": "Authorization URL created",
            "data": { "access_code": "abc" }
        })))
        .mount(&server)
        .await;

    let err = client
        .initialize_card_payment(TEST_EMAIL, MinorUnits(50050))
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::Mismatch(_)));
}

#[tokio::test]
async fn verify_reports_status_and_amount() {
    let (client, server) = client().await;

    Mock::given(method("GET"))
        .and(path("/transaction/verify/T685312322670591"))
        .and(header("authorization", format!("Bearer {TEST_SECRET}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": true,
            "message": "Verification successful",
            "data": {
                "reference": "T685312322670591",
                "status": "success",
                "amount": 50050,
                "currency": "GHS",
                "gateway_response": "Approved"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let verification = client.verify("T685312322670591").await.unwrap();

    assert_eq!(verification.status, TransactionStatus::Success);
    assert_eq!(verification.amount, MinorUnits(50050));
    assert_eq!(verification.amount.to_major(), 500.5);
    assert_eq!(verification.currency.as_deref(), Some("GHS"));
}

#[tokio::test]
async fn unreachable_gateway_is_a_network_error() {
    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);

    let client = PaystackClient::new(&paystack_settings(&uri)).unwrap();
    let err = client.verify("r1").await.unwrap_err();

    assert!(matches!(err, GatewayError::Network(_)));
}
