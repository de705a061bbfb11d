pub mod bar;
pub mod manager;
pub mod worker;

pub use bar::{BarAnchor, BarDisplay, BarTransform, LoadingBar};
pub use manager::{LoadEvent, LoadFailurePolicy, LoadProgress, LoadingManager};
pub use worker::{AssetLoader, AssetResult};
