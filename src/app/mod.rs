// Application layer - Use case interactors

pub mod container;
pub mod sync_interactor;

// Re-export interactors
pub use container::{AppContainer, DefaultAppContainer};
pub use sync_interactor::{SyncInteractor, SyncReport, SyncRequest};
