//! Audio data types, clips, tone generation and spatial mix math

pub mod clip;
pub mod spatial;
pub mod tone;
pub mod types;

pub use clip::{load_wav, Clip, ClipReader};
pub use types::{
    BufferFormat, Channels, ListenerProperty, MixParams, SampleWidth, SourceProperty, Vec3,
};
