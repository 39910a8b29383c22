mod normalizer;

pub use normalizer::{SymphoniaNormalizer, TARGET_SAMPLE_RATE};
