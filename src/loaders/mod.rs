pub mod gltf;

pub use gltf::{load_model, parse_model, ChannelData, ClipData, ModelData, ModelNode, ModelPrimitive};
