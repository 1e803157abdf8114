mod cli;
mod parsers;
mod types;

#[cfg(test)]
mod tests;

pub use cli::HammerArgs;
pub use parsers::{parse_duration_arg, parse_header};
pub use types::{HttpMethod, PositiveU64, PositiveUsize};
