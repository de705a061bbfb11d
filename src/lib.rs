pub mod app;
pub mod camera;
pub mod cli;
pub mod config;
pub mod core;
pub mod geometry;
pub mod gui;
pub mod loaders;
pub mod loading;
pub mod math;
pub mod renderer;
pub mod scene;
pub mod scenes;
pub mod traits;
pub mod uniforms;

pub use app::{AppContext, LoopState, TickStage};
pub use config::LagoonConfig;
pub use scenes::ScenePreset;
