use std::future::Future;

use tokio::task::JoinHandle;

/// A spawned timer task that is aborted when the handle is dropped.
#[derive(Debug)]
pub(crate) struct ScopedTimer(JoinHandle<()>);

impl ScopedTimer {
    pub(crate) fn spawn(task: impl Future<Output = ()> + Send + 'static) -> Self {
        Self(tokio::spawn(task))
    }
}

impl Drop for ScopedTimer {
    fn drop(&mut self) {
        self.0.abort();
    }
}
