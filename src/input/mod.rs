pub mod bind;
pub mod capability;
pub mod sample;
