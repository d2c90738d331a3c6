//! Checkout session state and the submission lifecycle.
//!
//! A [`CheckoutSession`] is everything the form knows between mount and page
//! reload: the client secret, the card field state and where the last
//! submission got to. It is plain data so the lifecycle can run outside a
//! browser; the component keeps one in a `Rc<RefCell<_>>`.

use std::cell::RefCell;

use async_trait::async_trait;

use crate::error::CheckoutError;
use crate::intent::ClientSecret;
use crate::stripe::{PaymentIntentInfo, StripeError};
use crate::validation::{CardChangeEvent, ValidationState};

/// Prefix of the message shown when confirmation fails.
pub const FAILURE_PREFIX: &str = "Payment failed ";

/// Prefix of the message shown when no PaymentIntent could be created.
pub const INTENT_FAILURE_PREFIX: &str = "Could not start checkout: ";

/// Prefix of the message shown when the card field could not be mounted.
pub const CARD_FAILURE_PREFIX: &str = "Could not load the card form: ";

/// Confirms a PaymentIntent with the card the customer entered.
///
/// The implementation owns the card instrument; callers only pass the secret.
#[async_trait(?Send)]
pub trait PaymentConfirmer {
    async fn confirm_card_payment(
        &self,
        secret: &ClientSecret,
    ) -> Result<PaymentIntentInfo, StripeError>;
}

/// Where the current submission stands.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum SubmissionState {
    /// Nothing submitted yet.
    #[default]
    Idle,
    /// Waiting on Stripe.
    Processing,
    /// Paid. Final for this session.
    Succeeded,
    /// Stripe refused the payment; the customer may try again.
    Failed(String),
}

/// Result of one call to [`submit_payment`].
#[derive(Clone, Debug, PartialEq)]
pub enum SubmitOutcome {
    /// The guard refused the submission; Stripe was not called.
    Skipped,
    Succeeded(PaymentIntentInfo),
    Failed(StripeError),
}

/// Identifies one PaymentIntent request. Only the latest one may store a secret.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IntentTicket(u64);

#[derive(Clone, Debug, Default)]
pub struct CheckoutSession {
    secret: Option<ClientSecret>,
    intent_generation: u64,
    intent_error: Option<String>,
    card_error: Option<String>,
    validation: ValidationState,
    state: SubmissionState,
    error: Option<String>,
    receipt: Option<PaymentIntentInfo>,
}

impl CheckoutSession {
    /// Start a new PaymentIntent request.
    ///
    /// Drops the current secret, which belongs to the previous order, and
    /// supersedes every request still in flight.
    pub fn begin_intent(&mut self) -> IntentTicket {
        self.intent_generation += 1;
        self.secret = None;
        self.intent_error = None;
        IntentTicket(self.intent_generation)
    }

    fn is_current(&self, ticket: IntentTicket) -> bool {
        ticket.0 == self.intent_generation
    }

    /// Store the secret for `ticket`. Returns `false` if a newer request superseded it.
    pub fn secret_ready(&mut self, ticket: IntentTicket, secret: ClientSecret) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.secret = Some(secret);
        self.intent_error = None;
        true
    }

    /// Record that the request for `ticket` failed. Returns `false` if superseded.
    pub fn intent_failed(&mut self, ticket: IntentTicket, err: &CheckoutError) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.secret = None;
        self.intent_error = Some(format!("{}{}", INTENT_FAILURE_PREFIX, err));
        true
    }

    /// Stripe.js or the card field is unavailable.
    pub fn card_failed(&mut self, err: &StripeError) {
        self.card_error = Some(format!("{}{}", CARD_FAILURE_PREFIX, err));
    }

    pub fn apply_card_change(&mut self, event: &CardChangeEvent) {
        self.validation.apply(event);
        self.error = self
            .validation
            .has_error()
            .then(|| self.validation.error_message.clone());
    }

    pub fn secret(&self) -> Option<&ClientSecret> {
        self.secret.as_ref()
    }

    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    pub fn receipt(&self) -> Option<&PaymentIntentInfo> {
        self.receipt.as_ref()
    }

    pub fn is_processing(&self) -> bool {
        self.state == SubmissionState::Processing
    }

    pub fn is_succeeded(&self) -> bool {
        self.state == SubmissionState::Succeeded
    }

    /// Whether the pay button must be disabled.
    pub fn button_disabled(&self) -> bool {
        self.is_processing() || self.validation.disabled || self.is_succeeded()
    }

    pub fn can_submit(&self) -> bool {
        self.secret.is_some() && !self.button_disabled()
    }

    /// Message for the inline error line, if any.
    pub fn error_message(&self) -> Option<&str> {
        self.intent_error
            .as_deref()
            .or(self.card_error.as_deref())
            .or(self.error.as_deref())
    }

    /// Move to `Processing` and hand out the secret, or refuse.
    pub fn begin_submission(&mut self) -> Option<ClientSecret> {
        if !self.can_submit() {
            return None;
        }
        self.state = SubmissionState::Processing;
        self.error = None;
        self.secret.clone()
    }

    /// Record the confirmation result. Ignored unless a submission is in flight.
    pub fn finish_submission(&mut self, outcome: &Result<PaymentIntentInfo, StripeError>) -> bool {
        if !self.is_processing() {
            return false;
        }
        match outcome {
            Ok(intent) => {
                self.state = SubmissionState::Succeeded;
                self.error = None;
                self.receipt = Some(intent.clone());
            }
            Err(err) => {
                let message = format!("{}{}", FAILURE_PREFIX, err.message);
                self.error = Some(message.clone());
                self.state = SubmissionState::Failed(message);
            }
        }
        true
    }
}

/// Run one submission attempt against `confirmer`.
///
/// The switch to `Processing` happens before the first await, so a second
/// attempt started while this one is pending is skipped. No borrow of
/// `session` is held across the await. `notify` runs after every change.
pub async fn submit_payment<C>(
    confirmer: &C,
    session: &RefCell<CheckoutSession>,
    notify: impl Fn(),
) -> SubmitOutcome
where
    C: PaymentConfirmer + ?Sized,
{
    let secret = session.borrow_mut().begin_submission();
    let Some(secret) = secret else {
        tracing::debug!("submission refused by guard");
        return SubmitOutcome::Skipped;
    };
    notify();

    let outcome = confirmer.confirm_card_payment(&secret).await;
    let applied = session.borrow_mut().finish_submission(&outcome);
    notify();

    match outcome {
        Ok(intent) if applied => {
            tracing::info!(payment_intent = %intent.id, status = %intent.status, "payment confirmed");
            SubmitOutcome::Succeeded(intent)
        }
        Err(err) if applied => {
            tracing::warn!(code = ?err.code, "payment failed: {}", err.message);
            SubmitOutcome::Failed(err)
        }
        _ => SubmitOutcome::Skipped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::CardInputError;
    use std::cell::Cell;
    use tokio::sync::oneshot;

    /// Stands in for Stripe in test mode: the outcome depends on the card typed.
    struct TestModeCard {
        number: &'static str,
        calls: Cell<usize>,
    }

    impl TestModeCard {
        fn new(number: &'static str) -> Self {
            TestModeCard {
                number,
                calls: Cell::new(0),
            }
        }
    }

    #[async_trait(?Send)]
    impl PaymentConfirmer for TestModeCard {
        async fn confirm_card_payment(
            &self,
            secret: &ClientSecret,
        ) -> Result<PaymentIntentInfo, StripeError> {
            self.calls.set(self.calls.get() + 1);
            match self.number {
                "4242 4242 4242 4242" => Ok(PaymentIntentInfo {
                    id: secret.expose().split("_secret").next().unwrap().to_string(),
                    status: "succeeded".into(),
                    amount: 4000,
                    currency: "usd".into(),
                }),
                "4000 0000 0000 9995" => Err(StripeError {
                    message: "Your card has insufficient funds.".into(),
                    error_type: Some("card_error".into()),
                    code: Some("card_declined".into()),
                }),
                _ => Err(StripeError::new("card declined")),
            }
        }
    }

    fn filled_card() -> CardChangeEvent {
        CardChangeEvent {
            empty: false,
            complete: true,
            ..Default::default()
        }
    }

    fn ready_session() -> RefCell<CheckoutSession> {
        let mut session = CheckoutSession::default();
        let ticket = session.begin_intent();
        assert!(session.secret_ready(ticket, ClientSecret::new("pi_42_secret_abc").unwrap()));
        session.apply_card_change(&filled_card());
        RefCell::new(session)
    }

    #[tokio::test]
    async fn valid_test_card_succeeds() {
        let card = TestModeCard::new("4242 4242 4242 4242");
        let session = ready_session();

        let outcome = submit_payment(&card, &session, || {}).await;

        assert!(matches!(outcome, SubmitOutcome::Succeeded(ref pi) if pi.id == "pi_42"));
        let session = session.borrow();
        assert!(session.is_succeeded());
        assert!(session.button_disabled());
        assert_eq!(session.error_message(), None);
        assert_eq!(session.receipt().map(|r| r.amount), Some(4000));
    }

    #[tokio::test]
    async fn decline_test_card_fails() {
        let card = TestModeCard::new("4000 0000 0000 9995");
        let session = ready_session();

        let outcome = submit_payment(&card, &session, || {}).await;

        assert!(matches!(outcome, SubmitOutcome::Failed(_)));
        assert_eq!(
            session.borrow().state(),
            &SubmissionState::Failed("Payment failed Your card has insufficient funds.".into())
        );
    }

    #[tokio::test]
    async fn failure_message_is_prefixed() {
        let card = TestModeCard::new("0000");
        let session = ready_session();

        submit_payment(&card, &session, || {}).await;

        let session = session.borrow();
        assert_eq!(
            session.state(),
            &SubmissionState::Failed("Payment failed card declined".into())
        );
        assert_eq!(session.error_message(), Some("Payment failed card declined"));
        assert!(!session.button_disabled());
    }

    #[tokio::test]
    async fn failed_submissions_can_be_retried() {
        let session = ready_session();

        submit_payment(&TestModeCard::new("0000"), &session, || {}).await;
        let outcome = submit_payment(&TestModeCard::new("4242 4242 4242 4242"), &session, || {}).await;

        assert!(matches!(outcome, SubmitOutcome::Succeeded(_)));
        assert!(session.borrow().is_succeeded());
    }

    #[tokio::test]
    async fn no_call_without_a_secret() {
        let card = TestModeCard::new("4242 4242 4242 4242");
        let mut session = CheckoutSession::default();
        session.apply_card_change(&filled_card());
        let session = RefCell::new(session);

        let outcome = submit_payment(&card, &session, || {}).await;

        assert_eq!(outcome, SubmitOutcome::Skipped);
        assert_eq!(card.calls.get(), 0);
        assert_eq!(session.borrow().state(), &SubmissionState::Idle);
    }

    #[tokio::test]
    async fn no_call_while_card_is_empty() {
        let card = TestModeCard::new("4242 4242 4242 4242");
        let mut session = CheckoutSession::default();
        let ticket = session.begin_intent();
        session.secret_ready(ticket, ClientSecret::new("pi_1_secret_1").unwrap());
        let session = RefCell::new(session);

        assert_eq!(submit_payment(&card, &session, || {}).await, SubmitOutcome::Skipped);

        session.borrow_mut().apply_card_change(&filled_card());
        session.borrow_mut().apply_card_change(&CardChangeEvent {
            empty: true,
            ..Default::default()
        });
        assert_eq!(submit_payment(&card, &session, || {}).await, SubmitOutcome::Skipped);
        assert_eq!(card.calls.get(), 0);
    }

    #[tokio::test]
    async fn no_call_after_success() {
        let card = TestModeCard::new("4242 4242 4242 4242");
        let session = ready_session();

        submit_payment(&card, &session, || {}).await;
        let again = submit_payment(&card, &session, || {}).await;

        assert_eq!(again, SubmitOutcome::Skipped);
        assert_eq!(card.calls.get(), 1);
    }

    #[test]
    fn no_submission_while_processing() {
        let mut session = ready_session().into_inner();

        assert!(session.begin_submission().is_some());
        assert!(session.button_disabled());
        assert!(session.begin_submission().is_none());
    }

    #[test]
    fn stray_results_are_ignored() {
        let mut session = ready_session().into_inner();

        assert!(!session.finish_submission(&Ok(PaymentIntentInfo::default())));
        assert_eq!(session.state(), &SubmissionState::Idle);
    }

    /// Confirmer whose answer is held back until the test releases it.
    struct GatedCard {
        answer: RefCell<Option<oneshot::Receiver<Result<PaymentIntentInfo, StripeError>>>>,
        calls: Cell<u32>,
    }

    #[async_trait(?Send)]
    impl PaymentConfirmer for GatedCard {
        async fn confirm_card_payment(
            &self,
            _secret: &ClientSecret,
        ) -> Result<PaymentIntentInfo, StripeError> {
            self.calls.set(self.calls.get() + 1);
            let answer = self.answer.borrow_mut().take().expect("confirmed twice");
            answer.await.expect("answer dropped")
        }
    }

    #[tokio::test]
    async fn second_submission_is_skipped_while_the_first_is_pending() {
        let (release, answer) = oneshot::channel();
        let card = GatedCard {
            answer: RefCell::new(Some(answer)),
            calls: Cell::new(0),
        };
        let session = ready_session();

        let first = submit_payment(&card, &session, || {});
        let second = async {
            // let the first attempt reach the pending confirmation
            tokio::task::yield_now().await;
            assert!(session.borrow().is_processing());
            assert!(session.borrow().button_disabled());

            let outcome = submit_payment(&card, &session, || {}).await;
            release
                .send(Ok(PaymentIntentInfo {
                    id: "pi_42".into(),
                    status: "succeeded".into(),
                    ..Default::default()
                }))
                .unwrap();
            outcome
        };
        let (first, second) = tokio::join!(first, second);

        assert_eq!(second, SubmitOutcome::Skipped);
        assert!(matches!(first, SubmitOutcome::Succeeded(ref pi) if pi.id == "pi_42"));
        assert_eq!(card.calls.get(), 1);
        assert!(session.borrow().is_succeeded());
    }

    #[tokio::test]
    async fn notify_runs_on_each_transition() {
        let card = TestModeCard::new("4242 4242 4242 4242");
        let session = ready_session();
        let renders = Cell::new(0);

        submit_payment(&card, &session, || renders.set(renders.get() + 1)).await;

        assert_eq!(renders.get(), 2);
    }

    #[test]
    fn typing_replaces_a_failure_message() {
        let mut session = ready_session().into_inner();
        session.begin_submission();
        session.finish_submission(&Err(StripeError::new("card declined")));

        session.apply_card_change(&CardChangeEvent {
            empty: false,
            error: Some(CardInputError {
                message: "Your card number is incomplete.".into(),
                error_type: None,
                code: None,
            }),
            ..Default::default()
        });
        assert_eq!(session.error_message(), Some("Your card number is incomplete."));

        session.apply_card_change(&filled_card());
        assert_eq!(session.error_message(), None);
    }

    #[test]
    fn card_mount_errors_are_shown() {
        let mut session = CheckoutSession::default();
        session.card_failed(&StripeError::new("Invalid API Key provided"));

        assert_eq!(
            session.error_message(),
            Some("Could not load the card form: Invalid API Key provided")
        );
    }

    #[test]
    fn intent_errors_stay_visible() {
        let mut session = CheckoutSession::default();
        let ticket = session.begin_intent();
        session.intent_failed(ticket, &CheckoutError::Network("offline".into()));
        session.apply_card_change(&filled_card());

        assert_eq!(
            session.error_message(),
            Some("Could not start checkout: Network error: offline")
        );
        assert!(!session.can_submit());
    }

    #[test]
    fn a_failed_refetch_drops_the_previous_secret() {
        let mut session = ready_session().into_inner();
        assert!(session.can_submit());

        // the order changed: the old secret no longer matches it
        let ticket = session.begin_intent();
        assert!(session.secret().is_none());
        assert!(!session.can_submit());

        session.intent_failed(ticket, &CheckoutError::Status(500));
        assert!(session.secret().is_none());
        assert!(!session.can_submit());
        assert_eq!(
            session.error_message(),
            Some("Could not start checkout: Server error: 500")
        );
    }

    #[test]
    fn superseded_intent_results_are_ignored() {
        let mut session = CheckoutSession::default();
        let older = session.begin_intent();
        let newer = session.begin_intent();

        assert!(session.secret_ready(newer, ClientSecret::new("pi_2_secret_new").unwrap()));
        assert!(!session.secret_ready(older, ClientSecret::new("pi_1_secret_old").unwrap()));
        assert!(!session.intent_failed(older, &CheckoutError::Status(500)));

        assert_eq!(
            session.secret().map(ClientSecret::expose),
            Some("pi_2_secret_new")
        );
        assert_eq!(session.error_message(), None);
    }

    #[test]
    fn card_errors_survive_a_successful_intent() {
        let mut session = CheckoutSession::default();
        session.card_failed(&StripeError::new("Stripe.js failed to load"));

        let ticket = session.begin_intent();
        session.secret_ready(ticket, ClientSecret::new("pi_3_secret_3").unwrap());

        assert_eq!(
            session.error_message(),
            Some("Could not load the card form: Stripe.js failed to load")
        );
    }
}
