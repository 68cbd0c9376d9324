pub mod ela;
pub mod noise;
pub mod spectrum;
