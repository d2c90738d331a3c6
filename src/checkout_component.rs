//! A drop-in Yew checkout form for buying courses by card.
//!
//! This component loads Stripe.js, asks your backend for a PaymentIntent
//! for the order, mounts a Card Element, and confirms the payment on submit,
//! then emits typed success or error callbacks to your app.

use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use crate::components::{ErrorText, OrderSummary, SubmitButton, SuccessPanel, TestCardList};
use crate::config::CheckoutConfig;
use crate::error::CheckoutError;
use crate::intent::{initialize_intent, CourseOrder, HttpIntentBackend};
use crate::interop::{stripe_js_unavailable, use_stripejs, StripeJsStatus};
use crate::session::{submit_payment, CheckoutSession, SubmitOutcome};
use crate::stripe::{CardWidget, PaymentIntentInfo};
use crate::validation::CardChangeEvent;

/// Properties for the [`CourseCheckout`] component.
///
/// # Fields
///
/// * `config` – Stripe key, backend endpoint, unit price and card styling.
/// * `num_courses` – How many courses are being bought (default: 1).
/// * `on_success` – Callback invoked with the confirmed [`PaymentIntentInfo`].
/// * `on_error` – Callback invoked with every [`CheckoutError`] the form shows.
/// * `button_label` – Override the Pay button text (default: `"Pay now"`).
/// * `children` – Extra Yew nodes (e.g. course list) rendered above the form.
#[derive(Properties, PartialEq, Clone)]
pub struct CourseCheckoutProps {
    pub config: CheckoutConfig,
    #[prop_or(1)]
    pub num_courses: u32,
    #[prop_or_default]
    pub on_success: Callback<PaymentIntentInfo>,
    #[prop_or_default]
    pub on_error: Callback<CheckoutError>,
    #[prop_or_default]
    pub button_label: Option<AttrValue>,
    #[prop_or_default]
    pub children: Children,
}

/// Yew function component rendering the course checkout form.
///
/// This component will:
/// 1. Request a PaymentIntent for `num_courses × unit_price` from
///    `config.intent_endpoint`, once per order.
/// 2. Load `config.stripe_js_src` once per page and mount a Card Element into
///    `config.card_mount_selector`.
/// 3. Keep the Pay button disabled while the card field is empty, while a
///    payment is processing, and after it succeeded.
/// 4. On submit, call `stripe.confirmCardPayment()` with the client secret and
///    the card, then show the success panel or the error message.
///
/// Card numbers stay inside Stripe's iframe; this crate never sees them.
///
/// # Example
///
/// ```rust,ignore
/// use yew::prelude::*;
/// use yew_course_checkout::{CheckoutConfig, CourseCheckout, PaymentIntentInfo, CheckoutError};
///
/// #[function_component(App)]
/// fn app() -> Html {
///     let config = CheckoutConfig::new("pk_test_123");
///     let on_success = Callback::from(|info: PaymentIntentInfo| {
///         tracing::info!("Payment succeeded: {}", info.id);
///     });
///     let on_error = Callback::from(|err: CheckoutError| {
///         tracing::error!("Payment failed: {}", err);
///     });
///
///     html! {
///         <CourseCheckout {config} num_courses={2} {on_success} {on_error}>
///             <h2>{ "Rust for Beginners, Async Rust" }</h2>
///         </CourseCheckout>
///     }
/// }
/// ```
#[function_component(CourseCheckout)]
pub fn course_checkout(props: &CourseCheckoutProps) -> Html {
    let stripe_js = use_stripejs(&props.config.stripe_js_src);
    let session = use_mut_ref(CheckoutSession::default);
    let widget = use_mut_ref(|| None::<CardWidget>);
    let trigger = use_force_update();
    let order = CourseOrder::new(props.num_courses, props.config.unit_price);

    // 1) Request a PaymentIntent once per order
    {
        let session = session.clone();
        let trigger = trigger.clone();
        let on_error = props.on_error.clone();
        let endpoint = props.config.intent_endpoint.clone();
        use_effect_with((endpoint, order), move |(endpoint, order)| {
            let backend = HttpIntentBackend::new(endpoint.as_str());
            let order = *order;
            spawn_local(async move {
                let notify = move || trigger.force_update();
                if let Err(err) = initialize_intent(&backend, order, &session, notify).await {
                    on_error.emit(err);
                }
            });
            || ()
        });
    }

    // 2) Once Stripe.js is loaded, mount the Card Element; report a failed load
    {
        let session = session.clone();
        let widget = widget.clone();
        let trigger = trigger.clone();
        let on_error = props.on_error.clone();
        let config = props.config.clone();
        use_effect_with(stripe_js, move |status| {
            if *status == StripeJsStatus::Failed {
                let err = stripe_js_unavailable(&config.stripe_js_src);
                session.borrow_mut().card_failed(&err);
                trigger.force_update();
                on_error.emit(err.into());
            } else if status.is_ready() {
                let on_change = {
                    let session = session.clone();
                    let trigger = trigger.clone();
                    Callback::from(move |event: CardChangeEvent| {
                        session.borrow_mut().apply_card_change(&event);
                        trigger.force_update();
                    })
                };
                match CardWidget::mount(
                    &config.publishable_key,
                    &config.card_element_options(),
                    &config.card_mount_selector,
                    on_change,
                ) {
                    Ok(mounted) => *widget.borrow_mut() = Some(mounted),
                    Err(err) => {
                        tracing::error!("card element failed to mount: {}", err);
                        session.borrow_mut().card_failed(&err);
                        trigger.force_update();
                        on_error.emit(err.into());
                    }
                }
            }
            move || {
                if let Some(mounted) = widget.borrow_mut().take() {
                    if let Err(err) = mounted.unmount() {
                        tracing::warn!("card element failed to unmount: {}", err);
                    }
                }
            }
        });
    }

    // 3) On submit, confirm the payment
    let onsubmit = {
        let session = session.clone();
        let widget = widget.clone();
        let trigger = trigger.clone();
        let on_success = props.on_success.clone();
        let on_error = props.on_error.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            let confirmer = widget.borrow().clone();
            let Some(confirmer) = confirmer else {
                tracing::debug!("submit before the card element was mounted");
                return;
            };
            let session = session.clone();
            let trigger = trigger.clone();
            let on_success = on_success.clone();
            let on_error = on_error.clone();
            spawn_local(async move {
                let notify = move || trigger.force_update();
                match submit_payment(&confirmer, &session, notify).await {
                    SubmitOutcome::Succeeded(intent) => on_success.emit(intent),
                    SubmitOutcome::Failed(err) => on_error.emit(err.into()),
                    SubmitOutcome::Skipped => {}
                }
            });
        })
    };

    let (processing, disabled, succeeded, error, receipt_id) = {
        let current = session.borrow();
        (
            current.is_processing(),
            current.button_disabled(),
            current.is_succeeded(),
            current.error_message().map(|m| AttrValue::from(m.to_string())),
            current
                .receipt()
                .filter(|r| !r.id.is_empty())
                .map(|r| AttrValue::from(r.id.clone())),
        )
    };
    let card_mount_id = props.config.card_mount_id().unwrap_or("card-element").to_string();
    let label = props
        .button_label
        .clone()
        .unwrap_or(AttrValue::Static("Pay now"));

    html! {
        <form id="payment-form" class="course-checkout" {onsubmit}>
            { for props.children.iter() }
            <OrderSummary {order} currency_symbol={props.config.currency_symbol.clone()} />
            if stripe_js == StripeJsStatus::Loading {
                <p class="loading">{ "Loading payment form…" }</p>
            }
            <div id={card_mount_id} class="card-element"></div>
            <SubmitButton {label} {processing} {disabled} />
            <ErrorText message={error} />
            <SuccessPanel visible={succeeded} payment_intent_id={receipt_id} />
            <TestCardList />
        </form>
    }
}
