use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("Failed to create histogram: {message}")]
    HistogramCreate { message: String },
    #[error("Failed to record latency: {message}")]
    HistogramRecord { message: String },
    #[error("Failed to merge histogram: {message}")]
    HistogramMerge { message: String },
    #[error("Failed to serialize histogram: {message}")]
    HistogramSerialize { message: String },
    #[error("Failed to decode histogram: {message}")]
    HistogramDecode { message: String },
    #[error("Failed to deserialize histogram: {message}")]
    HistogramDeserialize { message: String },
}
