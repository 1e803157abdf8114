mod client;
mod dispatch;

#[cfg(test)]
mod tests;

pub use client::{build_client, preflight_resolve};
pub use dispatch::{DispatchOutcome, HttpDispatcher, RequestDispatch};
