//! Checkout configuration.
//!
//! Everything that used to be baked into the page (backend URL, unit price,
//! Stripe key) comes from a [`CheckoutConfig`]. Pages usually embed it as JSON:
//!
//! ```html
//! <script type="application/json" id="checkout-config">
//!   { "publishableKey": "pk_test_...", "unitPrice": 20 }
//! </script>
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::CheckoutError;
use crate::stripe::CardElementOptions;

pub const DEFAULT_INTENT_ENDPOINT: &str = "/payment/create-payment-intent";
pub const DEFAULT_UNIT_PRICE: u64 = 20;
pub const DEFAULT_STRIPE_JS_SRC: &str = "https://js.stripe.com/v3/";
pub const DEFAULT_CARD_MOUNT_SELECTOR: &str = "#card-element";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct CheckoutConfig {
    /// Stripe publishable key (`pk_…`).
    pub publishable_key: String,
    /// Backend endpoint creating the PaymentIntent.
    pub intent_endpoint: String,
    /// Price of one course.
    pub unit_price: u64,
    /// Shown in front of the order total.
    pub currency_symbol: String,
    /// Where Stripe.js is loaded from.
    pub stripe_js_src: String,
    /// `#id` selector of the node the Card Element mounts into.
    pub card_mount_selector: String,
    /// Stripe Elements style object for the card field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_style: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hide_postal_code: Option<bool>,
    /// `tracing` filter directive, e.g. `"debug"`.
    pub log_level: String,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        CheckoutConfig {
            publishable_key: String::new(),
            intent_endpoint: DEFAULT_INTENT_ENDPOINT.to_string(),
            unit_price: DEFAULT_UNIT_PRICE,
            currency_symbol: "$".to_string(),
            stripe_js_src: DEFAULT_STRIPE_JS_SRC.to_string(),
            card_mount_selector: DEFAULT_CARD_MOUNT_SELECTOR.to_string(),
            card_style: None,
            hide_postal_code: None,
            log_level: "info".to_string(),
        }
    }
}

impl CheckoutConfig {
    /// Defaults plus the given publishable key.
    pub fn new(publishable_key: impl Into<String>) -> Self {
        CheckoutConfig {
            publishable_key: publishable_key.into(),
            ..Default::default()
        }
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, CheckoutError> {
        let config: CheckoutConfig = serde_json::from_str(json).map_err(CheckoutError::config)?;
        config.validate()?;
        Ok(config)
    }

    /// Read the JSON configuration embedded in the element with id `element_id`.
    pub fn from_element(element_id: &str) -> Result<Self, CheckoutError> {
        let element = web_sys::window()
            .and_then(|win| win.document())
            .ok_or_else(|| CheckoutError::js("no document"))?
            .get_element_by_id(element_id)
            .ok_or_else(|| CheckoutError::config(format!("no element #{}", element_id)))?;
        let json = element.text_content().unwrap_or_default();
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<(), CheckoutError> {
        if !self.publishable_key.starts_with("pk_") {
            return Err(CheckoutError::config(
                "publishableKey must be a Stripe publishable key (pk_...)",
            ));
        }
        if self.intent_endpoint.trim().is_empty() {
            return Err(CheckoutError::config("intentEndpoint must not be empty"));
        }
        if self.card_mount_id().is_none() {
            return Err(CheckoutError::config("cardMountSelector must be an id selector (#...)"));
        }
        Ok(())
    }

    /// Element id behind `card_mount_selector`.
    pub fn card_mount_id(&self) -> Option<&str> {
        self.card_mount_selector
            .strip_prefix('#')
            .filter(|id| !id.is_empty() && !id.contains(char::is_whitespace))
    }

    pub fn card_element_options(&self) -> CardElementOptions {
        CardElementOptions {
            style: self.card_style.clone(),
            hide_postal_code: self.hide_postal_code,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_keys_take_defaults() {
        let config = CheckoutConfig::from_json(r#"{"publishableKey":"pk_test_123"}"#).unwrap();
        assert_eq!(config, CheckoutConfig::new("pk_test_123"));
        assert_eq!(config.intent_endpoint, "/payment/create-payment-intent");
        assert_eq!(config.unit_price, 20);
    }

    #[test]
    fn overrides_are_read() {
        let config = CheckoutConfig::from_json(
            r##"{
                "publishableKey": "pk_live_abc",
                "intentEndpoint": "https://api.example.com/pay",
                "unitPrice": 35,
                "cardStyle": { "base": { "color": "#32325d" } },
                "hidePostalCode": true
            }"##,
        )
        .unwrap();
        assert_eq!(config.unit_price, 35);
        assert_eq!(config.intent_endpoint, "https://api.example.com/pay");

        let options = config.card_element_options();
        assert_eq!(options.hide_postal_code, Some(true));
        assert_eq!(options.style, Some(json!({ "base": { "color": "#32325d" } })));
    }

    #[test]
    fn secret_keys_are_rejected() {
        let err = CheckoutConfig::from_json(r#"{"publishableKey":"sk_test_123"}"#).unwrap_err();
        assert!(matches!(err, CheckoutError::Config(_)));
    }

    #[test]
    fn empty_endpoint_is_rejected() {
        let mut config = CheckoutConfig::new("pk_test_123");
        config.intent_endpoint = " ".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn mount_selector_must_name_an_id() {
        let mut config = CheckoutConfig::new("pk_test_123");
        assert_eq!(config.card_mount_id(), Some("card-element"));

        config.card_mount_selector = ".card".into();
        assert!(config.validate().is_err());

        config.card_mount_selector = "#".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        assert!(matches!(
            CheckoutConfig::from_json("{ nope"),
            Err(CheckoutError::Config(_))
        ));
    }
}
