pub mod chunk;
pub mod clock;
pub mod decode;
pub mod pipeline;
pub mod resample;
