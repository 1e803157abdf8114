mod io;
mod types;

#[cfg(test)]
#[allow(clippy::panic)]
mod tests;

pub use io::{MAX_MESSAGE_BYTES, read_message, write_message};
pub use types::{ConfigMessage, ErrorMessage, ReportMessage, StreamMessage, WireMessage, WireSummary};
