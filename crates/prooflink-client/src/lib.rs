//! prooflink-client: submit a single proof and wait for its acknowledgement.
//!
//! The binary opens a channel to the configured endpoint, reads one line of
//! proof data (or takes it from `--data`), runs one exchange and exits. An
//! interrupt at any point releases the channel and exits cleanly.

pub mod cli;
pub mod input;
pub mod interrupt;
pub mod session;

pub use cli::{Cli, CliLogFormat};
pub use input::{prompt_and_read, read_proof_line, PROMPT};
pub use interrupt::{spawn_interrupt_watcher, watch_interrupt, ChannelSlot};
pub use session::{run, run_with, submit, ClientConfig};
