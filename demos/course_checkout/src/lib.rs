use wasm_bindgen::prelude::*;
use yew::prelude::*;
use yew_course_checkout::{
    init_default_logging, init_logging, CheckoutConfig, CheckoutError, CourseCheckout,
    PaymentIntentInfo,
};

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    yew::Renderer::<CourseCheckoutDemo>::new().render();
}

#[function_component(CourseCheckoutDemo)]
fn course_checkout_demo() -> Html {
    // Configuration lives in index.html
    let config = use_memo((), |_| CheckoutConfig::from_element("checkout-config"));

    let config = match &*config {
        Ok(config) => {
            init_logging(&config.log_level);
            config.clone()
        }
        Err(err) => {
            init_default_logging();
            tracing::error!("bad checkout config: {}", err);
            return html! { <p style="color:red;">{ err.to_string() }</p> };
        }
    };

    let on_success = Callback::from(|info: PaymentIntentInfo| {
        tracing::info!("🎉 paid, payment intent {}", info.id);
    });
    let on_error = Callback::from(|err: CheckoutError| {
        tracing::warn!("checkout error: {}", err);
    });

    html! {
        <CourseCheckout {config} num_courses={2} {on_success} {on_error}>
            <h2>{ "Your basket" }</h2>
            <ul>
                <li>{ "Rust for Beginners" }</li>
                <li>{ "Async Rust in Practice" }</li>
            </ul>
        </CourseCheckout>
    }
}
