mod color;

pub use color::{linear_to_srgb, srgb_to_linear, Rgb};
