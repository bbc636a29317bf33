pub mod classifier;
pub mod manager;

pub use classifier::{Predictor, XrayClassifier};
pub use manager::{ModelManager, ModelStats};
