//! Payment intent creation.
//!
//! The backend creates the PaymentIntent with the secret key; the browser only
//! ever sees the client secret it hands back.

use std::cell::RefCell;
use std::fmt;

use async_trait::async_trait;
use gloo_net::http::Request;
use serde::{Deserialize, Serialize};

use crate::error::CheckoutError;
use crate::session::CheckoutSession;

/// Opaque client secret of one PaymentIntent.
///
/// Never empty. `Debug` does not print it.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientSecret(String);

impl ClientSecret {
    pub fn new(secret: impl Into<String>) -> Result<Self, CheckoutError> {
        let secret = secret.into();
        if secret.trim().is_empty() {
            return Err(CheckoutError::EmptySecret);
        }
        Ok(ClientSecret(secret))
    }

    /// The secret as Stripe.js expects it.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ClientSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ClientSecret(..)")
    }
}

/// One line of the order. The backend only counts them.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CourseItem {
    pub id: String,
}

impl Default for CourseItem {
    fn default() -> Self {
        CourseItem { id: "course".into() }
    }
}

/// Body of `POST /payment/create-payment-intent`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentIntentRequest {
    pub courses_to_buy: Vec<CourseItem>,
    /// Unit price; the backend multiplies it by the number of courses.
    pub price: u64,
}

/// Response of the intent endpoint.
#[derive(Deserialize, Debug)]
struct CreatePaymentIntentResponse {
    #[serde(rename = "clientSecret", alias = "client_secret")]
    client_secret: String,
}

/// What the customer is buying.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CourseOrder {
    pub num_courses: u32,
    pub unit_price: u64,
}

impl CourseOrder {
    pub fn new(num_courses: u32, unit_price: u64) -> Self {
        CourseOrder {
            num_courses,
            unit_price,
        }
    }

    /// Amount shown to the customer.
    pub fn total(&self) -> u64 {
        u64::from(self.num_courses) * self.unit_price
    }

    pub fn to_request(&self) -> CreatePaymentIntentRequest {
        CreatePaymentIntentRequest {
            courses_to_buy: vec![CourseItem::default(); self.num_courses as usize],
            price: self.unit_price,
        }
    }
}

/// Anything that can turn an order into a PaymentIntent client secret.
#[async_trait(?Send)]
pub trait IntentBackend {
    async fn create_payment_intent(
        &self,
        request: &CreatePaymentIntentRequest,
    ) -> Result<ClientSecret, CheckoutError>;
}

/// [`IntentBackend`] calling the checkout backend over HTTP.
#[derive(Clone, Debug)]
pub struct HttpIntentBackend {
    endpoint: String,
}

impl HttpIntentBackend {
    pub fn new(endpoint: impl Into<String>) -> Self {
        HttpIntentBackend {
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait(?Send)]
impl IntentBackend for HttpIntentBackend {
    async fn create_payment_intent(
        &self,
        request: &CreatePaymentIntentRequest,
    ) -> Result<ClientSecret, CheckoutError> {
        let response = Request::post(&self.endpoint)
            .json(request)?
            .send()
            .await?;
        if !response.ok() {
            return Err(CheckoutError::Status(response.status()));
        }
        let body: CreatePaymentIntentResponse = response.json().await?;
        ClientSecret::new(body.client_secret)
    }
}

/// Request a PaymentIntent for `order` and store the outcome in `session`.
///
/// Any secret from an earlier order is dropped before the request goes out.
/// Failures are recorded on the session, so the form can show them, and
/// returned for the caller's own reporting. A response that arrives after a
/// newer request started is discarded and reported as `Ok(())`. `notify` runs
/// after the session changed.
pub async fn initialize_intent<B>(
    backend: &B,
    order: CourseOrder,
    session: &RefCell<CheckoutSession>,
    notify: impl Fn(),
) -> Result<(), CheckoutError>
where
    B: IntentBackend + ?Sized,
{
    tracing::info!(
        courses = order.num_courses,
        unit_price = order.unit_price,
        "requesting payment intent"
    );
    let ticket = session.borrow_mut().begin_intent();
    notify();

    let outcome = backend.create_payment_intent(&order.to_request()).await;
    let result = match outcome {
        Ok(secret) => {
            if session.borrow_mut().secret_ready(ticket, secret) {
                tracing::debug!("payment intent ready");
            } else {
                tracing::debug!("discarding payment intent of a superseded order");
            }
            Ok(())
        }
        Err(err) => {
            if session.borrow_mut().intent_failed(ticket, &err) {
                tracing::error!("payment intent request failed: {}", err);
                Err(err)
            } else {
                tracing::debug!("ignoring failure of a superseded intent request: {}", err);
                Ok(())
            }
        }
    };
    notify();
    result
}
