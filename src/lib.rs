//! PlantCare: an upload form that sends a leaf photo to a remote
//! classifier and shows the disease it reports.

pub mod client;
pub mod config;
pub mod controller;
pub mod error;
pub mod model;
pub mod page;
pub mod web;

pub use client::{HttpPredictor, Predictor};
pub use config::{Config, PredictorConfig};
pub use controller::{Phase, RequestOutcome, UploadController, ViewState};
pub use error::{ConfigError, PredictError, PredictResult};
pub use model::{ImageFile, PredictionResult, PreviewId, Selection};
