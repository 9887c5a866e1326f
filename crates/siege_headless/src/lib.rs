//! Headless battle runner for AI testing and CI verification.
//!
//! This crate drives the simulation without any presentation layer:
//!
//! - **Interactive**: JSON commands on stdin, JSON responses on stdout
//! - **Single match**: run one scenario to completion and report metrics
//! - **Batch**: many seeds in parallel with a win-rate summary
//! - **Replay verification**: check that a recorded match reproduces its hash
//!
//! # Protocol
//!
//! Communication uses JSON lines (one JSON object per line):
//!
//! - **stdin**: Commands from the controller (tick, recruit, command, ...)
//! - **stdout**: State updates and responses
//! - **stderr**: Logs (human-readable)
//!
//! See the [`protocol`] module for the message shapes.
//!
//! # Example
//!
//! ```bash
//! echo '{"cmd":"tick","count":50}' | cargo run -p siege_headless
//! cargo run -p siege_headless -- batch --scenario skirmish --count 200
//! ```

pub mod batch;
pub mod error;
pub mod game_runner;
pub mod metrics;
pub mod protocol;
pub mod runner;
pub mod scenario;

pub use batch::{run_batch, BatchConfig, BatchResults};
pub use error::ScenarioError;
pub use game_runner::{GameRunner, MatchSettings};
pub use metrics::{BatchSummary, GameMetrics, MetricsCollector};
pub use protocol::{Command, Response};
pub use runner::HeadlessRunner;
pub use scenario::Scenario;
