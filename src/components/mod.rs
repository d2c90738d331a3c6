use yew::prelude::*;

use crate::intent::CourseOrder;

/// Stripe test-mode card numbers listed under the form.
pub const TEST_CARDS: &[(&str, &str)] = &[
    ("4242 4242 4242 4242", "Payment succeeds"),
    ("4000 0025 0000 3155", "Payment requires 3-D Secure authentication"),
    ("4000 0000 0000 9995", "Payment is declined for insufficient funds"),
];

/// The pay button, with a spinner while a payment is in flight.
#[derive(Properties, PartialEq)]
pub struct SubmitButtonProps {
    /// Button label text
    pub label: AttrValue,
    /// Show the spinner instead of the label
    #[prop_or_default]
    pub processing: bool,
    /// Disable state
    #[prop_or_default]
    pub disabled: bool,
}

#[function_component(SubmitButton)]
pub fn submit_button(props: &SubmitButtonProps) -> Html {
    html! {
        <button
            id="submit"
            type="submit"
            disabled={props.disabled}
            class="ycc-button"
        >
            <span id="button-text">
                if props.processing {
                    <span class="spinner" id="spinner"></span>
                } else {
                    { props.label.clone() }
                }
            </span>
        </button>
    }
}

/// Inline error text under the card field.
#[derive(Properties, PartialEq)]
pub struct ErrorTextProps {
    #[prop_or_default]
    pub message: Option<AttrValue>,
}

#[function_component(ErrorText)]
pub fn error_text(props: &ErrorTextProps) -> Html {
    match &props.message {
        Some(message) => html! {
            <div class="card-error" role="alert">{ message.clone() }</div>
        },
        None => Html::default(),
    }
}

#[derive(Properties, PartialEq)]
pub struct SuccessPanelProps {
    pub visible: bool,
    /// PaymentIntent id, when Stripe reported one.
    #[prop_or_default]
    pub payment_intent_id: Option<AttrValue>,
}

/// Shown once the payment succeeded. Hidden, not removed, before that.
#[function_component(SuccessPanel)]
pub fn success_panel(props: &SuccessPanelProps) -> Html {
    let class = if props.visible { "result-message" } else { "result-message hidden" };
    html! {
        <p {class}>
            { "Payment succeeded, see the result in your " }
            <a href="https://dashboard.stripe.com/test/payments" target="_blank" rel="noopener noreferrer">
                { "Stripe dashboard." }
            </a>
            if let Some(id) = &props.payment_intent_id {
                { format!(" Reference: {}.", id) }
            }
            { " Refresh the page to pay again." }
        </p>
    }
}

#[derive(Properties, PartialEq)]
pub struct OrderSummaryProps {
    pub order: CourseOrder,
    #[prop_or(AttrValue::Static("$"))]
    pub currency_symbol: AttrValue,
}

#[function_component(OrderSummary)]
pub fn order_summary(props: &OrderSummaryProps) -> Html {
    let order = props.order;
    let noun = if order.num_courses == 1 { "course" } else { "courses" };
    html! {
        <div class="order-summary">
            <span>{ format!("{} {}", order.num_courses, noun) }</span>
            <strong class="order-total">
                { format!("Total: {}{}", props.currency_symbol, order.total()) }
            </strong>
        </div>
    }
}

/// Static list of Stripe test cards, for trying the form in test mode.
#[function_component(TestCardList)]
pub fn test_card_list() -> Html {
    html! {
        <div class="test-cards">
            <p>{ "Use any future expiry date, any CVC and any postal code with these test cards:" }</p>
            <ul>
                { for TEST_CARDS.iter().map(|(number, outcome)| html! {
                    <li key={*number}>
                        <code>{ *number }</code>{ ": " }{ *outcome }
                    </li>
                }) }
            </ul>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yew::LocalServerRenderer;

    async fn render<C>(props: C::Properties) -> String
    where
        C: BaseComponent,
    {
        LocalServerRenderer::<C>::with_props(props)
            .hydratable(false)
            .render()
            .await
    }

    #[tokio::test]
    async fn success_panel_is_hidden_until_payment_succeeds() {
        let hidden = render::<SuccessPanel>(SuccessPanelProps {
            visible: false,
            payment_intent_id: None,
        })
        .await;
        assert!(hidden.contains(r#"class="result-message hidden""#));

        let shown = render::<SuccessPanel>(SuccessPanelProps {
            visible: true,
            payment_intent_id: Some("pi_42".into()),
        })
        .await;
        assert!(shown.contains(r#"class="result-message""#));
        assert_eq!(shown.matches("Payment succeeded").count(), 1);
        assert!(shown.contains("Reference: pi_42."));
    }

    #[tokio::test]
    async fn order_summary_shows_the_total() {
        let html = render::<OrderSummary>(OrderSummaryProps {
            order: CourseOrder::new(3, 20),
            currency_symbol: "$".into(),
        })
        .await;
        assert!(html.contains("3 courses"));
        assert!(html.contains("Total: $60"));

        let single = render::<OrderSummary>(OrderSummaryProps {
            order: CourseOrder::new(1, 20),
            currency_symbol: "€".into(),
        })
        .await;
        assert!(single.contains("1 course<"));
        assert!(single.contains("Total: €20"));
    }

    #[tokio::test]
    async fn spinner_replaces_the_label_while_processing() {
        let idle = render::<SubmitButton>(SubmitButtonProps {
            label: "Pay now".into(),
            processing: false,
            disabled: false,
        })
        .await;
        assert!(idle.contains("Pay now"));
        assert!(!idle.contains("spinner"));

        let busy = render::<SubmitButton>(SubmitButtonProps {
            label: "Pay now".into(),
            processing: true,
            disabled: true,
        })
        .await;
        assert!(!busy.contains("Pay now"));
        assert!(busy.contains(r#"<span class="spinner""#));
        assert!(!busy.contains("<div"));
    }

    #[tokio::test]
    async fn error_text_renders_only_with_a_message() {
        let none = render::<ErrorText>(ErrorTextProps { message: None }).await;
        assert!(!none.contains("card-error"));

        let some = render::<ErrorText>(ErrorTextProps {
            message: Some("Payment failed Your card was declined.".into()),
        })
        .await;
        assert!(some.contains(r#"role="alert""#));
        assert!(some.contains("Payment failed Your card was declined."));
    }
}
