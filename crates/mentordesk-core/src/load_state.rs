//! Per-view fetch lifecycle.
//!
//! `Idle -> Loading -> {Loaded, Failed}`. `Failed` stays put until the view
//! retries, which re-enters `Loading`.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Loaded,
    Failed,
}

impl LoadState {
    /// True if mounting should issue the initial fetch.
    pub fn can_mount(self) -> bool {
        matches!(self, LoadState::Idle)
    }

    /// True if an explicit retry makes sense.
    pub fn can_retry(self) -> bool {
        matches!(self, LoadState::Failed)
    }

    pub fn is_loading(self) -> bool {
        matches!(self, LoadState::Loading)
    }

    /// State after a fetch is issued. Valid from every state.
    pub fn on_fetch_started(self) -> Self {
        LoadState::Loading
    }

    /// State after the latest fetch completes.
    pub fn on_fetch_done(self, succeeded: bool) -> Self {
        if succeeded {
            LoadState::Loaded
        } else {
            LoadState::Failed
        }
    }
}
