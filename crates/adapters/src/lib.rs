// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! supervisor-adapters: the only crate that touches `tokio::process`
//! directly. Spawning, signalling, and line-splitting a child's output
//! live here; the lifecycle controller in `supervisord` owns what happens
//! to the decoded lines.

pub mod process;
pub mod stream_reader;

pub use process::{force_kill, spawn, terminate, SpawnError, SpawnParams};
pub use stream_reader::{run_stream_reader, StreamLine};
