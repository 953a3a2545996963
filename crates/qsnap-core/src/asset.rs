//! Embedded asset readiness
//!
//! The host creates an [`AssetLoader`]/[`AssetHandle`] pair per embedded
//! asset (image) and reports the terminal state through the loader. Both
//! `Loaded` and `Failed` count as ready.

use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetState {
    Loading,
    Loaded,
    Failed,
}

impl AssetState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, AssetState::Loading)
    }
}

/// Host side of an asset: reports load completion.
#[derive(Debug)]
pub struct AssetLoader {
    tx: watch::Sender<AssetState>,
}

/// Capture side of an asset: waits for a terminal state.
#[derive(Debug, Clone)]
pub struct AssetHandle {
    rx: watch::Receiver<AssetState>,
}

impl AssetLoader {
    pub fn loaded(&self) {
        self.tx.send_replace(AssetState::Loaded);
    }

    pub fn failed(&self) {
        self.tx.send_replace(AssetState::Failed);
    }
}

impl AssetHandle {
    /// Create a pending asset.
    pub fn pending() -> (AssetLoader, AssetHandle) {
        let (tx, rx) = watch::channel(AssetState::Loading);
        (AssetLoader { tx }, AssetHandle { rx })
    }

    /// An asset that finished loading before it was discovered.
    pub fn complete() -> AssetHandle {
        let (_tx, rx) = watch::channel(AssetState::Loaded);
        AssetHandle { rx }
    }

    pub fn state(&self) -> AssetState {
        *self.rx.borrow()
    }

    /// Resolve once the asset reached a terminal state.
    ///
    /// A loader dropped while still loading is treated as `Failed`.
    pub async fn ready(&self) -> AssetState {
        let mut rx = self.rx.clone();
        match rx.wait_for(|state| state.is_terminal()).await {
            Ok(state) => *state,
            Err(_) => AssetState::Failed,
        }
    }
}
