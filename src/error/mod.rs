mod app;
mod http;
mod metrics;
mod validation;
mod worker;

pub use app::{AppError, AppResult};
pub use http::HttpError;
pub use metrics::MetricsError;
pub use validation::ValidationError;
pub use worker::WorkerError;
