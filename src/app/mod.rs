// Application layer - Use case interactors

pub mod container;
pub mod package_interactor;

// Re-export interactors
pub use container::{AppContainer, DefaultAppContainer};
pub use package_interactor::PackageInteractor;
