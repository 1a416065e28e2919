//! Trained classifiers and the registry that holds them

pub mod classifier;
pub mod loader;
pub mod onnx;
pub mod registry;

pub use classifier::Classifier;
pub use loader::ModelLoader;
pub use onnx::OnnxClassifier;
pub use registry::ModelRegistry;
