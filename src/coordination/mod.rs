//! Run coordination: cancellation shared between the CLI signal handler and
//! in-flight strategy runs.

pub mod cancel;

pub use cancel::CancelToken;
