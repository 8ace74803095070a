use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, PoisonError,
    },
    time::Duration,
};

use folio_core_contact_contracts::ContactFormService;
use folio_delivery_contracts::DeliveryChannel;
use folio_models::{
    contact::FormInput,
    submission::{FormStatus, SubmissionFailure, SubmissionState},
};
use timer::ScopedTimer;
use tokio::sync::watch;
use tracing::{debug, warn};
pub use validate::validate;

mod timer;
mod validate;

#[derive(Debug)]
pub struct ContactFormServiceImpl<Delivery> {
    delivery: Delivery,
    config: ContactFormConfig,
    shared: Arc<Shared>,
    revert_timer: Mutex<Option<ScopedTimer>>,
    torn_down: watch::Sender<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactFormConfig {
    /// How long the error state is shown before the form returns to idle.
    pub error_revert_delay: Duration,
    /// Minimum time spent in the sending state, regardless of how fast the
    /// delivery channel settles.
    pub min_send_delay: Duration,
}

impl Default for ContactFormConfig {
    fn default() -> Self {
        Self {
            error_revert_delay: Duration::from_secs(3),
            min_send_delay: Duration::from_millis(1500),
        }
    }
}

/// State shared with the timer tasks.
#[derive(Debug)]
struct Shared {
    status: watch::Sender<FormStatus>,
    /// Incremented whenever a submission is accepted. Timers scheduled for an
    /// older episode must not touch the state.
    episode: AtomicU64,
}

impl Shared {
    fn new() -> Self {
        Self {
            status: watch::Sender::new(FormStatus::default()),
            episode: AtomicU64::new(0),
        }
    }

    fn state(&self) -> SubmissionState {
        self.status.borrow().state
    }

    fn finish(&self, episode: u64, state: SubmissionState) -> bool {
        self.status.send_if_modified(|status| {
            if self.episode.load(Ordering::SeqCst) != episode
                || status.state != SubmissionState::Sending
            {
                return false;
            }
            status.state = state;
            true
        })
    }

    fn revert(&self, episode: u64) -> bool {
        self.status.send_if_modified(|status| {
            if self.episode.load(Ordering::SeqCst) != episode || !status.state.is_error() {
                return false;
            }
            *status = FormStatus::default();
            true
        })
    }
}

impl<Delivery> ContactFormServiceImpl<Delivery> {
    pub fn new(delivery: Delivery, config: ContactFormConfig) -> Self {
        Self {
            delivery,
            config,
            shared: Arc::new(Shared::new()),
            revert_timer: Default::default(),
            torn_down: watch::Sender::new(false),
        }
    }

    fn is_torn_down(&self) -> bool {
        *self.torn_down.borrow()
    }

    fn schedule_revert(&self, episode: u64) {
        let mut revert_timer = self
            .revert_timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if self.is_torn_down() || self.shared.episode.load(Ordering::SeqCst) != episode {
            return;
        }

        let shared = Arc::clone(&self.shared);
        let delay = self.config.error_revert_delay;
        *revert_timer = Some(ScopedTimer::spawn(async move {
            tokio::time::sleep(delay).await;
            if shared.revert(episode) {
                debug!(episode, "error state expired, form is idle again");
            }
        }));
    }

    fn cancel_revert(&self) {
        self.revert_timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    /// Resolves once the form has been torn down.
    async fn wait_torn_down(&self) {
        let mut rx = self.torn_down.subscribe();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}

impl<Delivery> ContactFormService for ContactFormServiceImpl<Delivery>
where
    Delivery: DeliveryChannel,
{
    async fn submit(&self, input: FormInput) -> SubmissionState {
        if self.is_torn_down() {
            return self.shared.state();
        }

        let errors = validate(&input);
        let valid = errors.is_valid();

        let mut episode = None;
        self.shared.status.send_if_modified(|status| {
            if matches!(
                status.state,
                SubmissionState::Sending | SubmissionState::Success
            ) {
                return false;
            }

            episode = Some(self.shared.episode.fetch_add(1, Ordering::SeqCst) + 1);
            *status = if valid {
                FormStatus {
                    state: SubmissionState::Sending,
                    errors: Default::default(),
                }
            } else {
                FormStatus {
                    state: SubmissionState::Error(SubmissionFailure::Validation),
                    errors,
                }
            };
            true
        });

        let Some(episode) = episode else {
            let state = self.shared.state();
            debug!(?state, "ignoring submit");
            return state;
        };

        // A resubmission from the error state supersedes the pending revert.
        self.cancel_revert();

        if !valid {
            debug!(episode, "contact form input is invalid");
            self.schedule_revert(episode);
            return SubmissionState::Error(SubmissionFailure::Validation);
        }

        debug!(episode, "sending contact message");
        let _abandoned = AbandonedSendGuard {
            form: self,
            episode,
        };
        let delivery = async {
            let (outcome, ()) = tokio::join!(
                self.delivery.deliver(input),
                tokio::time::sleep(self.config.min_send_delay)
            );
            outcome
        };

        let outcome = tokio::select! {
            biased;
            () = self.wait_torn_down() => None,
            outcome = delivery => Some(outcome),
        };

        let Some(outcome) = outcome.filter(|_| !self.is_torn_down()) else {
            debug!(episode, "contact form was torn down, discarding delivery outcome");
            return self.shared.state();
        };

        match outcome {
            Ok(()) => {
                self.shared.finish(episode, SubmissionState::Success);
                debug!(episode, "contact message delivered");
            }
            Err(err) => {
                warn!(episode, "failed to deliver contact message: {err}");
                if self
                    .shared
                    .finish(episode, SubmissionState::Error(SubmissionFailure::Delivery))
                {
                    self.schedule_revert(episode);
                }
            }
        }

        self.shared.state()
    }

    fn reset(&self) -> bool {
        if self.is_torn_down() {
            return false;
        }

        self.shared.status.send_if_modified(|status| {
            if status.state != SubmissionState::Success {
                return false;
            }
            *status = FormStatus::default();
            true
        })
    }

    fn status(&self) -> FormStatus {
        self.shared.status.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<FormStatus> {
        self.shared.status.subscribe()
    }

    fn teardown(&self) {
        let mut revert_timer = self
            .revert_timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if self.torn_down.send_replace(true) {
            return;
        }
        revert_timer.take();
        debug!("contact form torn down");
    }
}

/// Fails a `sending` episode whose `submit` future is dropped before the
/// delivery outcome is known, e.g. by a caller-side timeout. Does nothing if
/// the episode has already settled or the form was torn down.
struct AbandonedSendGuard<'a, Delivery> {
    form: &'a ContactFormServiceImpl<Delivery>,
    episode: u64,
}

impl<Delivery> Drop for AbandonedSendGuard<'_, Delivery> {
    fn drop(&mut self) {
        let Self { form, episode } = *self;
        if form.is_torn_down()
            || !form
                .shared
                .finish(episode, SubmissionState::Error(SubmissionFailure::Delivery))
        {
            return;
        }

        warn!(episode, "submit was abandoned while sending");
        if tokio::runtime::Handle::try_current().is_ok() {
            form.schedule_revert(episode);
        } else {
            form.shared.revert(episode);
        }
    }
}

impl<Delivery> Drop for ContactFormServiceImpl<Delivery> {
    fn drop(&mut self) {
        self.torn_down.send_replace(true);
        self.revert_timer
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }
}

#[cfg(test)]
mod tests {
    use folio_delivery_contracts::{DeliveryError, MockDeliveryChannel};
    use folio_models::contact::{FieldErrorKind, FormField};
    use folio_utils::assert_matches;
    use pretty_assertions::assert_eq;

    use super::*;

    fn valid_input() -> FormInput {
        FormInput {
            name: "Ann".into(),
            email: "ann@example.com".into(),
            message: "Hello there!".into(),
        }
    }

    fn make_sut(delivery: MockDeliveryChannel) -> Arc<ContactFormServiceImpl<MockDeliveryChannel>> {
        Arc::new(ContactFormServiceImpl::new(
            delivery,
            ContactFormConfig::default(),
        ))
    }

    fn spawn_submit(
        sut: &Arc<ContactFormServiceImpl<MockDeliveryChannel>>,
        input: FormInput,
    ) -> tokio::task::JoinHandle<SubmissionState> {
        let sut = Arc::clone(sut);
        tokio::spawn(async move { sut.submit(input).await })
    }

    async fn sleep_ms(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn initial_status() {
        // Arrange
        let sut = make_sut(MockDeliveryChannel::new());

        // Act
        let status = sut.status();

        // Assert
        assert_eq!(status, FormStatus::default());
        assert_eq!(status.state, SubmissionState::Idle);
        assert!(status.submit_enabled());
    }

    #[tokio::test(start_paused = true)]
    async fn validation_failure_reverts_to_idle() {
        // Arrange
        let sut = make_sut(MockDeliveryChannel::new());
        let input = FormInput {
            name: "".into(),
            email: "a@b.com".into(),
            message: "hi".into(),
        };

        // Act
        let state = sut.submit(input).await;

        // Assert
        assert_eq!(
            state,
            SubmissionState::Error(SubmissionFailure::Validation)
        );
        let status = sut.status();
        assert_eq!(status.errors.len(), 1);
        assert_matches!(
            status.errors.get(FormField::Name),
            Some(error) if error.kind == FieldErrorKind::Required
        );

        sleep_ms(2999).await;
        assert_eq!(
            sut.status().state,
            SubmissionState::Error(SubmissionFailure::Validation)
        );

        sleep_ms(2).await;
        assert_eq!(sut.status(), FormStatus::default());
    }

    #[tokio::test(start_paused = true)]
    async fn delivery_success() {
        // Arrange
        let sut = make_sut(MockDeliveryChannel::new().with_deliver(valid_input(), Ok(())));
        let mut rx = sut.subscribe();
        assert_eq!(rx.borrow_and_update().state, SubmissionState::Idle);

        // Act
        let handle = spawn_submit(&sut, valid_input());

        // Assert
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().state, SubmissionState::Sending);
        assert!(!sut.status().submit_enabled());

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().state, SubmissionState::Success);

        assert_eq!(handle.await.unwrap(), SubmissionState::Success);

        sleep_ms(60_000).await;
        assert_eq!(sut.status().state, SubmissionState::Success);
        assert!(sut.status().errors.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn delivery_failure_reverts_to_idle() {
        // Arrange
        let sut = make_sut(
            MockDeliveryChannel::new().with_deliver(valid_input(), Err(DeliveryError::Rejected)),
        );
        let mut rx = sut.subscribe();
        rx.borrow_and_update();

        // Act
        let handle = spawn_submit(&sut, valid_input());

        // Assert
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().state, SubmissionState::Sending);

        rx.changed().await.unwrap();
        let status = rx.borrow_and_update().clone();
        assert_eq!(
            status.state,
            SubmissionState::Error(SubmissionFailure::Delivery)
        );
        assert!(status.errors.is_empty());

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), FormStatus::default());

        assert_eq!(
            handle.await.unwrap(),
            SubmissionState::Error(SubmissionFailure::Delivery)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn outcome_waits_for_min_send_delay() {
        // Arrange
        let sut = make_sut(MockDeliveryChannel::new().with_deliver(valid_input(), Ok(())));

        // Act
        let handle = spawn_submit(&sut, valid_input());

        // Assert
        sleep_ms(1499).await;
        assert_eq!(sut.status().state, SubmissionState::Sending);

        sleep_ms(2).await;
        assert_eq!(sut.status().state, SubmissionState::Success);
        assert_eq!(handle.await.unwrap(), SubmissionState::Success);
    }

    #[tokio::test(start_paused = true)]
    async fn submit_while_sending_is_ignored() {
        // Arrange
        let sut = make_sut(MockDeliveryChannel::new().with_deliver(valid_input(), Ok(())));
        let handle = spawn_submit(&sut, valid_input());
        sleep_ms(1).await;
        assert_eq!(sut.status().state, SubmissionState::Sending);

        // Act
        let state = sut.submit(valid_input()).await;
        let invalid_state = sut.submit(FormInput::default()).await;

        // Assert
        assert_eq!(state, SubmissionState::Sending);
        assert_eq!(invalid_state, SubmissionState::Sending);
        assert!(sut.status().errors.is_empty());
        assert_eq!(handle.await.unwrap(), SubmissionState::Success);
    }

    #[tokio::test(start_paused = true)]
    async fn submit_after_success_is_ignored() {
        // Arrange
        let sut = make_sut(MockDeliveryChannel::new().with_deliver(valid_input(), Ok(())));
        assert_eq!(sut.submit(valid_input()).await, SubmissionState::Success);

        // Act
        let state = sut.submit(valid_input()).await;

        // Assert
        assert_eq!(state, SubmissionState::Success);
        assert_eq!(sut.status().state, SubmissionState::Success);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_after_success() {
        // Arrange
        let sut = make_sut(MockDeliveryChannel::new().with_deliver(valid_input(), Ok(())));
        assert_eq!(sut.submit(valid_input()).await, SubmissionState::Success);

        // Act
        let result = sut.reset();

        // Assert
        assert!(result);
        assert_eq!(sut.status(), FormStatus::default());
    }

    #[tokio::test(start_paused = true)]
    async fn reset_outside_success_is_ignored() {
        // Arrange
        let sut = make_sut(MockDeliveryChannel::new());
        sut.submit(FormInput::default()).await;

        // Act
        let result = sut.reset();

        // Assert
        assert!(!result);
        assert_eq!(
            sut.status().state,
            SubmissionState::Error(SubmissionFailure::Validation)
        );
        assert_eq!(sut.status().errors.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn resubmit_from_error_supersedes_revert() {
        // Arrange
        let sut = make_sut(MockDeliveryChannel::new().with_deliver(valid_input(), Ok(())));
        sut.submit(FormInput::default()).await;
        sleep_ms(2000).await;

        // Act
        let handle = spawn_submit(&sut, valid_input());

        // Assert
        sleep_ms(1).await;
        assert_eq!(sut.status().state, SubmissionState::Sending);
        assert!(sut.status().errors.is_empty());

        // the revert scheduled by the validation failure would have fired here
        sleep_ms(1200).await;
        assert_eq!(sut.status().state, SubmissionState::Sending);

        assert_eq!(handle.await.unwrap(), SubmissionState::Success);
        sleep_ms(10_000).await;
        assert_eq!(sut.status().state, SubmissionState::Success);
    }

    #[tokio::test(start_paused = true)]
    async fn fresh_validation_on_every_submit() {
        // Arrange
        let sut = make_sut(MockDeliveryChannel::new());
        sut.submit(FormInput::default()).await;

        // Act
        let state = sut
            .submit(FormInput {
                name: "Ann".into(),
                email: "bad-email".into(),
                message: "hi".into(),
            })
            .await;

        // Assert
        assert_eq!(
            state,
            SubmissionState::Error(SubmissionFailure::Validation)
        );
        let errors = sut.status().errors;
        assert_eq!(errors.len(), 1);
        assert_matches!(
            errors.get(FormField::Email),
            Some(error) if error.kind == FieldErrorKind::InvalidFormat
        );
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_cancels_revert_timer() {
        // Arrange
        let sut = make_sut(MockDeliveryChannel::new());
        sut.submit(FormInput::default()).await;

        // Act
        sut.teardown();

        // Assert
        sleep_ms(10_000).await;
        assert_eq!(
            sut.status().state,
            SubmissionState::Error(SubmissionFailure::Validation)
        );
        assert_eq!(
            sut.submit(valid_input()).await,
            SubmissionState::Error(SubmissionFailure::Validation)
        );
        assert!(!sut.reset());
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_discards_in_flight_outcome() {
        // Arrange
        let mut delivery = MockDeliveryChannel::new();
        delivery
            .expect_deliver()
            .once()
            .return_once(|_| Box::pin(std::future::pending()));
        let sut = make_sut(delivery);
        let handle = spawn_submit(&sut, valid_input());
        sleep_ms(1).await;

        // Act
        sut.teardown();

        // Assert
        assert_eq!(handle.await.unwrap(), SubmissionState::Sending);
        sleep_ms(10_000).await;
        assert_eq!(sut.status().state, SubmissionState::Sending);
    }

    #[tokio::test(start_paused = true)]
    async fn abandoned_submit_fails_and_reverts() {
        // Arrange
        let mut delivery = MockDeliveryChannel::new();
        delivery
            .expect_deliver()
            .once()
            .return_once(|_| Box::pin(std::future::pending()));
        let sut = make_sut(delivery);

        // Act
        let result =
            tokio::time::timeout(Duration::from_secs(5), sut.submit(valid_input())).await;

        // Assert
        assert!(result.is_err());
        assert_eq!(
            sut.status().state,
            SubmissionState::Error(SubmissionFailure::Delivery)
        );
        assert!(sut.status().errors.is_empty());

        sleep_ms(3001).await;
        assert_eq!(sut.status(), FormStatus::default());
        assert!(sut.status().submit_enabled());

        assert_eq!(
            sut.submit(FormInput::default()).await,
            SubmissionState::Error(SubmissionFailure::Validation)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn stale_revert_does_not_replace_current_timer() {
        // Arrange
        let sut = make_sut(MockDeliveryChannel::new());
        sut.submit(FormInput::default()).await;
        let stale_episode = sut.shared.episode.load(Ordering::SeqCst);
        sleep_ms(1000).await;
        sut.submit(FormInput::default()).await;

        // Act
        sut.schedule_revert(stale_episode);

        // Assert
        sleep_ms(2999).await;
        assert_eq!(
            sut.status().state,
            SubmissionState::Error(SubmissionFailure::Validation)
        );

        sleep_ms(2).await;
        assert_eq!(sut.status(), FormStatus::default());
    }

    #[tokio::test(start_paused = true)]
    async fn drop_cancels_revert_timer() {
        // Arrange
        let sut = make_sut(MockDeliveryChannel::new());
        sut.submit(FormInput::default()).await;
        let rx = sut.subscribe();

        // Act
        drop(sut);

        // Assert
        sleep_ms(10_000).await;
        assert_eq!(
            rx.borrow().state,
            SubmissionState::Error(SubmissionFailure::Validation)
        );
    }
}
