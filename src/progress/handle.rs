use super::{Error, ProgressReporter, TaskId};
use log::warn;

/// Guard bound to one tracked task.
///
/// Dropping the handle finishes the task, so the final status line is
/// printed exactly once even when the download loop bails out early or
/// panics. A disabled handle does nothing at all.
#[must_use = "dropping the handle finishes the task immediately"]
pub struct ProgressHandle {
    bound: Option<(ProgressReporter, TaskId)>,
}

impl std::fmt::Debug for ProgressHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressHandle")
            .field("id", &self.id())
            .finish()
    }
}

impl ProgressHandle {
    pub(super) fn tracked(reporter: ProgressReporter, id: TaskId) -> Self {
        Self {
            bound: Some((reporter, id)),
        }
    }

    pub fn disabled() -> Self {
        Self { bound: None }
    }

    pub fn id(&self) -> Option<TaskId> {
        self.bound.as_ref().map(|(_, id)| *id)
    }

    pub fn is_enabled(&self) -> bool {
        self.bound.is_some()
    }

    pub fn advance(&self, delta: u64) -> Result<(), Error> {
        match &self.bound {
            Some((reporter, id)) => reporter.advance(*id, delta),
            None => Ok(()),
        }
    }

    pub fn finish(mut self) -> Result<(), Error> {
        self.complete()
    }

    /// Adapter for download code that reports received bytes through a callback.
    pub fn callback(&self) -> impl Fn(u64) + Send + 'static {
        let bound = self.bound.clone();
        move |delta| {
            if let Some((reporter, id)) = &bound {
                if let Err(err) = reporter.advance(*id, delta) {
                    warn!("progress update for task {} failed: {}", id, err);
                }
            }
        }
    }

    fn complete(&mut self) -> Result<(), Error> {
        match self.bound.take() {
            Some((reporter, id)) => reporter.finish(id),
            None => Ok(()),
        }
    }
}

impl Drop for ProgressHandle {
    fn drop(&mut self) {
        if let Err(err) = self.complete() {
            warn!("failed to finish progress: {}", err);
        }
    }
}
