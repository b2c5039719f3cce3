mod error;
mod handle;
mod render;

pub use error::Error;
pub use handle::ProgressHandle;
pub use render::Renderer;

use crate::config::{Config, Style};
use crate::track_id::{extract_track_id, TrackId};
use indicatif::ProgressBar;
use log::debug;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

pub type TaskId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Downloading,
    Completed,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Downloading => f.write_str("Downloading"),
            Status::Completed => f.write_str("Completed"),
        }
    }
}

struct ProgressState {
    total: u64,
    completed: u64,
    description: String,
    track_id: TrackId,
    bar: Option<ProgressBar>,
}

impl ProgressState {
    fn percentage(&self) -> Result<f64, Error> {
        if self.total == 0 {
            return Err(Error::ZeroTotal {
                description: self.description.clone(),
            });
        }
        Ok(self.completed as f64 / self.total as f64 * 100.0)
    }

    fn status_line(&self, status: Status) -> Result<String, Error> {
        let percentage = self.percentage()?;
        Ok(format!(
            "{}: {} {}/{} ({:.1}%)",
            status, self.description, self.completed, self.total, percentage
        ))
    }
}

/// Point in time copy of one tracked task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub total: u64,
    pub completed: u64,
    pub description: String,
    pub track_id: TrackId,
}

impl From<&ProgressState> for ProgressSnapshot {
    fn from(state: &ProgressState) -> Self {
        Self {
            total: state.total,
            completed: state.completed,
            description: state.description.clone(),
            track_id: state.track_id.clone(),
        }
    }
}

struct Inner {
    tasks: Mutex<HashMap<TaskId, ProgressState>>,
    renderer: Mutex<Renderer>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Tracks download progress of individual tracks and prints status lines.
///
/// Clones share the same registry and output, so one reporter created by the
/// application can be handed to every downloader.
#[derive(Clone)]
pub struct ProgressReporter {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("tasks", &self.len())
            .finish()
    }
}

impl ProgressReporter {
    pub fn new(renderer: Renderer) -> Self {
        Self {
            inner: Arc::new(Inner {
                tasks: Mutex::new(HashMap::new()),
                renderer: Mutex::new(renderer),
            }),
        }
    }

    pub fn stdout() -> Self {
        Self::new(Renderer::stdout())
    }

    pub fn from_config(config: &Config) -> Self {
        match config.style {
            Style::Lines => Self::new(Renderer::stdout()),
            Style::Bars => Self::new(Renderer::bars()),
        }
    }

    /// Starts tracking a new task of `total` units.
    pub fn create_handle(&self, total: u64, description: impl Into<String>) -> ProgressHandle {
        let description = description.into();
        let track_id = extract_track_id(&description);
        let id = Uuid::new_v4();
        let bar = lock(&self.inner.renderer).start(total, &description);
        debug!("tracking task {} (track {}): {}", id, track_id, description);
        lock(&self.inner.tasks).insert(
            id,
            ProgressState {
                total,
                completed: 0,
                description,
                track_id,
                bar,
            },
        );
        ProgressHandle::tracked(self.clone(), id)
    }

    /// Returns a handle that does nothing when `enabled` is false.
    pub fn get_progress_callback(
        &self,
        enabled: bool,
        total: u64,
        description: impl Into<String>,
    ) -> ProgressHandle {
        if !enabled {
            return ProgressHandle::disabled();
        }
        self.create_handle(total, description)
    }

    pub fn advance(&self, id: TaskId, delta: u64) -> Result<(), Error> {
        let mut tasks = lock(&self.inner.tasks);
        let state = tasks.get_mut(&id).ok_or(Error::UnknownTask(id))?;
        state.completed = state
            .completed
            .checked_add(delta)
            .ok_or_else(|| Error::Overflow {
                description: state.description.clone(),
                completed: state.completed,
                delta,
            })?;
        let line = state.status_line(Status::Downloading)?;
        lock(&self.inner.renderer).update(state, &line)?;
        Ok(())
    }

    /// Prints the final line of a task and forgets it.
    ///
    /// The task is removed even if printing fails.
    pub fn finish(&self, id: TaskId) -> Result<(), Error> {
        let state = lock(&self.inner.tasks)
            .remove(&id)
            .ok_or(Error::UnknownTask(id))?;
        debug!(
            "finished task {} (track {}): {}/{}",
            id, state.track_id, state.completed, state.total
        );
        let line = match state.status_line(Status::Completed) {
            Ok(line) => line,
            Err(err) => {
                if let Some(bar) = &state.bar {
                    bar.abandon();
                }
                return Err(err);
            }
        };
        lock(&self.inner.renderer).complete(&state, &line)?;
        Ok(())
    }

    pub fn add_title(&self, title: &str) -> Result<(), Error> {
        lock(&self.inner.renderer).line(&format!("Added task: {}", title))?;
        Ok(())
    }

    pub fn remove_title(&self, title: &str) -> Result<(), Error> {
        lock(&self.inner.renderer).line(&format!("Removed task: {}", title))?;
        Ok(())
    }

    /// Has no effect.
    pub fn clear_progress(&self) {}

    pub fn snapshot(&self, id: TaskId) -> Option<ProgressSnapshot> {
        lock(&self.inner.tasks).get(&id).map(ProgressSnapshot::from)
    }

    pub fn len(&self) -> usize {
        lock(&self.inner.tasks).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}


#[cfg(test)]
mod tests {
    use super::testing::SharedBuffer;
    use super::{Error, ProgressReporter, Renderer};
    use crate::track_id::TrackId;
    use anyhow::Result;
    use indicatif::ProgressDrawTarget;

    fn reporter() -> (ProgressReporter, SharedBuffer) {
        let buffer = SharedBuffer::default();
        let reporter = ProgressReporter::new(Renderer::lines(buffer.clone()));
        (reporter, buffer)
    }

    #[test]
    fn test_advance_accumulates() -> Result<()> {
        let (reporter, output) = reporter();
        let handle = reporter.create_handle(200, "https://tidal.com/browse/track/445566");
        let id = handle.id().unwrap();
        handle.advance(10)?;
        handle.advance(40)?;

        let snapshot = reporter.snapshot(id).unwrap();
        assert_eq!(snapshot.completed, 50);
        assert_eq!(snapshot.total, 200);
        assert_eq!(snapshot.track_id, TrackId::Found("445566".to_string()));
        assert_eq!(
            output.lines(),
            vec![
                "Downloading: https://tidal.com/browse/track/445566 10/200 (5.0%)",
                "Downloading: https://tidal.com/browse/track/445566 50/200 (25.0%)",
            ]
        );
        Ok(())
    }

    #[test]
    fn test_percentage_one_decimal() -> Result<()> {
        let (reporter, output) = reporter();
        let handle = reporter.create_handle(3, "x");
        handle.advance(1)?;
        handle.advance(1)?;
        handle.advance(1)?;
        assert_eq!(
            output.lines(),
            vec![
                "Downloading: x 1/3 (33.3%)",
                "Downloading: x 2/3 (66.7%)",
                "Downloading: x 3/3 (100.0%)",
            ]
        );
        Ok(())
    }

    #[test]
    fn test_finish_prints_completed_and_removes() -> Result<()> {
        let (reporter, output) = reporter();
        let handle = reporter.create_handle(100, "song.flac");
        handle.advance(100)?;
        assert_eq!(reporter.len(), 1);
        handle.finish()?;

        assert!(reporter.is_empty());
        assert_eq!(
            output.lines().last().map(String::as_str),
            Some("Completed: song.flac 100/100 (100.0%)")
        );
        Ok(())
    }

    #[test]
    fn test_operations_after_finish_fail() -> Result<()> {
        let (reporter, output) = reporter();
        let handle = reporter.create_handle(10, "x");
        let id = handle.id().unwrap();
        reporter.finish(id)?;

        assert!(matches!(handle.advance(1), Err(Error::UnknownTask(task)) if task == id));
        assert!(matches!(reporter.finish(id), Err(Error::UnknownTask(_))));
        assert!(matches!(handle.finish(), Err(Error::UnknownTask(_))));
        assert_eq!(output.lines(), vec!["Completed: x 0/10 (0.0%)"]);
        Ok(())
    }

    #[test]
    fn test_zero_total() {
        let (reporter, output) = reporter();
        let handle = reporter.create_handle(0, "empty");
        let id = handle.id().unwrap();

        assert!(matches!(handle.advance(5), Err(Error::ZeroTotal { .. })));
        assert_eq!(reporter.snapshot(id).map(|s| s.completed), Some(5));
        assert!(matches!(handle.finish(), Err(Error::ZeroTotal { .. })));
        assert!(reporter.is_empty());
        assert!(output.lines().is_empty());
    }

    #[test]
    fn test_disabled_callback() -> Result<()> {
        let (reporter, output) = reporter();
        let handle = reporter.get_progress_callback(false, 100, "x");
        assert!(!handle.is_enabled());
        assert_eq!(handle.id(), None);
        assert!(reporter.is_empty());

        handle.advance(50)?;
        handle.finish()?;
        assert!(reporter.is_empty());
        assert!(output.lines().is_empty());
        Ok(())
    }

    #[test]
    fn test_enabled_callback() -> Result<()> {
        let (reporter, output) = reporter();
        let handle = reporter.get_progress_callback(true, 4, "x");
        assert!(handle.is_enabled());
        handle.advance(1)?;
        drop(handle);
        assert_eq!(
            output.lines(),
            vec!["Downloading: x 1/4 (25.0%)", "Completed: x 1/4 (25.0%)"]
        );
        Ok(())
    }

    #[test]
    fn test_titles() -> Result<()> {
        let (reporter, output) = reporter();
        reporter.add_title("Album")?;
        reporter.remove_title("Album")?;
        reporter.clear_progress();
        assert!(reporter.is_empty());
        assert_eq!(
            output.lines(),
            vec!["Added task: Album", "Removed task: Album"]
        );
        Ok(())
    }

    #[test]
    fn test_independent_tasks() -> Result<()> {
        let (reporter, _) = reporter();
        let first = reporter.create_handle(10, "a");
        let second = reporter.create_handle(10, "b");
        assert_ne!(first.id(), second.id());

        first.advance(3)?;
        second.advance(7)?;
        assert_eq!(reporter.snapshot(first.id().unwrap()).unwrap().completed, 3);
        assert_eq!(reporter.snapshot(second.id().unwrap()).unwrap().completed, 7);

        first.finish()?;
        assert_eq!(reporter.len(), 1);
        second.finish()?;
        assert!(reporter.is_empty());
        Ok(())
    }

    #[test]
    fn test_advance_overflow() -> Result<()> {
        let (reporter, output) = reporter();
        let handle = reporter.create_handle(u64::MAX, "huge");
        let id = handle.id().unwrap();
        handle.advance(u64::MAX - 1)?;
        assert!(matches!(
            handle.advance(2),
            Err(Error::Overflow { completed, delta: 2, .. }) if completed == u64::MAX - 1
        ));
        assert_eq!(reporter.snapshot(id).unwrap().completed, u64::MAX - 1);
        assert_eq!(output.lines().len(), 1);

        handle.advance(1)?;
        assert_eq!(reporter.snapshot(id).unwrap().completed, u64::MAX);
        assert!(matches!(handle.advance(1), Err(Error::Overflow { .. })));
        assert_eq!(output.lines().len(), 2);
        Ok(())
    }

    #[test]
    fn test_concurrent_advance() -> Result<()> {
        let (reporter, _) = reporter();
        let handle = reporter.create_handle(4000, "parallel");
        let id = handle.id().unwrap();
        std::thread::scope(|s| {
            for _ in 0..4 {
                let callback = handle.callback();
                s.spawn(move || {
                    for _ in 0..1000 {
                        callback(1);
                    }
                });
            }
        });
        assert_eq!(reporter.snapshot(id).unwrap().completed, 4000);
        handle.finish()?;
        Ok(())
    }

    #[test]
    fn test_bars() -> Result<()> {
        let reporter = ProgressReporter::new(Renderer::bars_with_target(ProgressDrawTarget::hidden()));
        reporter.add_title("Album")?;
        let handle = reporter.create_handle(100, "https://www.qobuz.com/api.json?eid=987654");
        let id = handle.id().unwrap();
        handle.advance(60)?;
        assert_eq!(reporter.snapshot(id).unwrap().completed, 60);
        assert_eq!(
            reporter.snapshot(id).unwrap().track_id,
            TrackId::Found("987654".to_string())
        );
        handle.finish()?;
        assert!(reporter.is_empty());

        let empty = reporter.create_handle(0, "empty");
        assert!(matches!(empty.finish(), Err(Error::ZeroTotal { .. })));
        Ok(())
    }
}
