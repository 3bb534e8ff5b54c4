//! Checkout against a file-backed cart, with stand-in collaborators.

use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use eazyy_core::{Email, FulfillmentType, OrderId, OrderType};
use eazyy_integration_tests::{data_dir, reopen, shirts, wash};
use eazyy_storefront::LineInput;
use eazyy_storefront::checkout::{
    Checkout, CheckoutDetails, CheckoutError, CreatedOrder, CustomerInfo, OrderBackend,
    OrderRequest, OrderSummary, Schedule,
};
use eazyy_storefront::services::{BackendError, Coordinates, Geocoder, GeocodingError};
use rust_decimal::Decimal;

const ORDER: &str = "0f0e0d0c-0b0a-4909-8807-060504030201";
const RUG: &str = "33333333-2222-4333-8444-555555555555";
const CARPETS: &str = "0a0b0c0d-1e1f-4a2b-9c3d-4e5f6a7b8c9d";

struct Amsterdam;

impl Geocoder for Amsterdam {
    async fn geocode(&self, _address: &str) -> Result<Coordinates, GeocodingError> {
        Ok(Coordinates {
            latitude: 52.3676,
            longitude: 4.9041,
        })
    }
}

#[derive(Clone, Default)]
struct SharedBackend {
    refuse: bool,
    requests: Arc<Mutex<Vec<OrderRequest>>>,
}

impl OrderBackend for SharedBackend {
    async fn create_order(&self, request: &OrderRequest) -> Result<CreatedOrder, BackendError> {
        self.requests.lock().unwrap().push(request.clone());
        if self.refuse {
            return Err(BackendError::Api {
                status: 503,
                message: "Service unavailable".to_owned(),
            });
        }
        Ok(CreatedOrder {
            id: OrderId::parse(ORDER).unwrap(),
            order_number: "ORD000000042".to_owned(),
            total_amount: None,
        })
    }
}

fn details() -> CheckoutDetails {
    let mut details = CheckoutDetails::new(
        CustomerInfo {
            name: "Anna de Vries".to_owned(),
            email: Email::parse("anna@example.nl").unwrap(),
            phone: Some("+31 6 12345678".to_owned()),
        },
        "Damrak 1, Amsterdam",
        Schedule::pickup_on(NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()),
    );
    details.fulfillment = FulfillmentType::Pickup;
    details
}

#[tokio::test]
async fn test_successful_checkout_removes_cart_file() {
    let dir = data_dir();
    let backend = SharedBackend::default();
    let checkout = Checkout::new(Amsterdam, backend.clone());

    let mut cart = reopen(&dir);
    let _ = cart.add_item(shirts(2), wash());
    let summary = OrderSummary::from_cart(cart.state());

    let order = checkout.place_order(&mut cart, &details()).await.unwrap();
    assert_eq!(order.order_number, "ORD000000042");
    assert_eq!(summary.total, Decimal::new(1210, 2));
    assert!(!dir.path().join("cart.json").exists());
    assert!(reopen(&dir).state().is_empty());

    let requests = backend.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].fulfillment, FulfillmentType::Pickup);
    assert_eq!(requests[0].order_type, OrderType::Standard);
}

#[tokio::test]
async fn test_unpriced_line_books_custom_quote_order() {
    let dir = data_dir();
    let backend = SharedBackend::default();
    let checkout = Checkout::new(Amsterdam, backend.clone());

    let mut cart = reopen(&dir);
    let _ = cart.add_item(shirts(1), wash());
    let _ = cart.add_item(LineInput::new(RUG, CARPETS, "Persian rug", None, 1), wash());

    checkout.place_order(&mut cart, &details()).await.unwrap();

    let requests = backend.requests.lock().unwrap();
    assert_eq!(requests[0].order_type, OrderType::CustomQuote);
    assert_eq!(requests[0].items.len(), 2);
}

#[tokio::test]
async fn test_refused_order_keeps_cart_on_disk() {
    let dir = data_dir();
    let backend = SharedBackend {
        refuse: true,
        ..SharedBackend::default()
    };
    let checkout = Checkout::new(Amsterdam, backend);

    let mut cart = reopen(&dir);
    let _ = cart.add_item(shirts(3), wash());

    let err = checkout.place_order(&mut cart, &details()).await.unwrap_err();
    assert!(matches!(err, CheckoutError::Backend(BackendError::Api { status: 503, .. })));
    assert_eq!(reopen(&dir).total_items(), 3);
}
