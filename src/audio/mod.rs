pub mod analysis;
pub mod decode;
pub mod frames;

pub use decode::{decode_audio, AudioData};
