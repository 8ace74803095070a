use std::future::Future;

use folio_models::{
    contact::FormInput,
    submission::{FormStatus, SubmissionState},
};
use tokio::sync::watch;

/// Owns the submission state of a single contact form.
pub trait ContactFormService: Send + Sync + 'static {
    /// Validates `input` and, if it is valid, hands it to the delivery channel.
    ///
    /// Resolves once the submission episode has settled and returns the
    /// resulting state. Submitting while a previous attempt is still being
    /// sent, or after a successful one, has no effect and returns the current
    /// state.
    fn submit(&self, input: FormInput) -> impl Future<Output = SubmissionState> + Send;

    /// Returns to the idle state after a successful submission.
    ///
    /// Returns `false` if the form was not in the success state.
    fn reset(&self) -> bool;

    /// Returns a snapshot of the current state and field errors.
    fn status(&self) -> FormStatus;

    /// Subscribes to status changes. Dropping the receiver unsubscribes.
    fn subscribe(&self) -> watch::Receiver<FormStatus>;

    /// Cancels all pending timers and discards the outcome of an in-flight
    /// delivery. The form ignores all further events.
    fn teardown(&self);
}
