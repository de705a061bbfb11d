pub mod cancel;
pub mod clock;
pub mod controller;
pub mod input_adapter;
pub mod orbit;
pub mod resize;
pub mod reveal;
pub mod timer;
pub mod tween;

pub use cancel::CancellationToken;
pub use clock::{FrameClock, FrameTime, ManualTime, SystemTime, TimeSource};
pub use controller::{Button, Controller};
pub use input_adapter::WinitController;
pub use orbit::{OrbitControls, OrbitSettings};
pub use resize::{handle_resize, Viewport, MAX_PIXEL_RATIO};
pub use reveal::{RevealEvent, RevealSequence, RevealTimings};
pub use timer::{FpsCounter, Throttled};
pub use tween::{Easing, Tween};
