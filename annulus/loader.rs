//! Load-state machine for the grid.
//!
//! The grid is read from storage exactly once, off the caller's thread. Until
//! that completes the slot reports [`LoadState::Unloaded`] or
//! [`LoadState::Loading`]; afterwards it is [`LoadState::Ready`] for good, or
//! [`LoadState::Failed`] until a caller explicitly asks for another attempt.
//!
//! ```text
//! Unloaded -> Loading -> Ready
//!                    \-> Failed -> Loading -> ...
//! ```

use crate::calculator::CalculatorError;
use crate::grid::{AadGrid, GridError};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone)]
pub enum LoadState {
    Unloaded,
    Loading,
    Ready(Arc<AadGrid>),
    Failed(Arc<GridError>),
}

impl LoadState {
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Unloaded => "unloaded",
            Self::Loading => "loading",
            Self::Ready(_) => "ready",
            Self::Failed(_) => "failed",
        }
    }

    /// The grid if ready, otherwise the error a query should see.
    fn resolve(&self) -> Result<Arc<AadGrid>, CalculatorError> {
        match self {
            Self::Ready(grid) => Ok(Arc::clone(grid)),
            Self::Failed(err) => Err(CalculatorError::ModelUnavailable(Arc::clone(err))),
            Self::Unloaded | Self::Loading => Err(CalculatorError::NotReady),
        }
    }
}

/// Owns the grid and its load state.
#[derive(Debug)]
pub struct GridSlot {
    state: Arc<watch::Sender<LoadState>>,
}

impl Default for GridSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl GridSlot {
    pub fn new() -> Self {
        Self {
            state: Arc::new(watch::Sender::new(LoadState::Unloaded)),
        }
    }

    /// A slot that starts out ready with an already validated grid.
    pub fn ready(grid: AadGrid) -> Self {
        Self {
            state: Arc::new(watch::Sender::new(LoadState::Ready(Arc::new(grid)))),
        }
    }

    pub fn state(&self) -> LoadState {
        self.state.borrow().clone()
    }

    /// The loaded grid, without waiting.
    ///
    /// Fails with [`CalculatorError::NotReady`] while unloaded or loading.
    pub fn grid(&self) -> Result<Arc<AadGrid>, CalculatorError> {
        self.state.borrow().resolve()
    }

    /// Waits until a load attempt resolves, then returns its outcome.
    ///
    /// Calls made before any load has started wait for the next one.
    pub async fn wait_ready(&self) -> Result<Arc<AadGrid>, CalculatorError> {
        let mut receiver = self.state.subscribe();
        loop {
            let state = receiver.borrow_and_update().clone();
            match state {
                LoadState::Unloaded | LoadState::Loading => {}
                resolved => return resolved.resolve(),
            }
            if receiver.changed().await.is_err() {
                return Err(CalculatorError::NotReady);
            }
        }
    }

    /// Reads and validates the grid file at `path`.
    pub async fn load_from_path(
        &self,
        path: impl Into<PathBuf>,
    ) -> Result<Arc<AadGrid>, CalculatorError> {
        let path = path.into();
        self.load_with(move || {
            log::info!("Loading AAD grid from {}", path.display());
            AadGrid::load(&path)
        })
        .await
    }

    /// Runs `loader` on the blocking pool if this call wins the right to load.
    ///
    /// A ready slot returns its grid without calling `loader`; a slot that is
    /// already loading waits for that attempt instead of starting another.
    ///
    /// The outcome is published by a detached task, so dropping this future
    /// mid-load does not leave the slot in [`LoadState::Loading`].
    pub async fn load_with<F>(&self, loader: F) -> Result<Arc<AadGrid>, CalculatorError>
    where
        F: FnOnce() -> Result<AadGrid, GridError> + Send + 'static,
    {
        let mut claimed = false;
        self.state.send_if_modified(|state| match state {
            LoadState::Unloaded | LoadState::Failed(_) => {
                *state = LoadState::Loading;
                claimed = true;
                true
            }
            LoadState::Loading | LoadState::Ready(_) => false,
        });
        if !claimed {
            log::debug!("Grid load requested while {}", self.state.borrow().describe());
            return self.wait_ready().await;
        }

        let state = Arc::clone(&self.state);
        let publisher = tokio::spawn(async move {
            let outcome = match tokio::task::spawn_blocking(loader).await {
                Ok(result) => result,
                Err(join_error) => Err(task_failure(join_error)),
            };
            publish(&state, outcome)
        });

        match publisher.await {
            Ok(result) => result,
            Err(join_error) => publish(&self.state, Err(task_failure(join_error))),
        }
    }
}

fn task_failure(join_error: tokio::task::JoinError) -> GridError {
    GridError::Io(std::io::Error::other(format!(
        "grid loading task did not complete: {join_error}"
    )))
}

/// Moves a claimed slot out of `Loading` and hands the outcome to the caller.
fn publish(
    state: &watch::Sender<LoadState>,
    outcome: Result<AadGrid, GridError>,
) -> Result<Arc<AadGrid>, CalculatorError> {
    match outcome {
        Ok(grid) => {
            let grid = Arc::new(grid);
            log::info!("AAD grid ready. {}", grid.summary());
            state.send_replace(LoadState::Ready(Arc::clone(&grid)));
            Ok(grid)
        }
        Err(err) => {
            log::warn!("AAD grid failed to load: {err}");
            let err = Arc::new(err);
            state.send_replace(LoadState::Failed(Arc::clone(&err)));
            Err(CalculatorError::ModelUnavailable(err))
        }
    }
}
