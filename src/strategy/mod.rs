//! Strategy execution
//!
//! ## Architecture
//!
//! - `retry`     - Bounded retry and eventual-consistency polling
//! - `planner`   - Strategy steps -> unsigned transaction plans
//! - `sequencer` - Ordered, retry-wrapped submission of one step
//! - `scanner`   - Position discovery for unwind
//! - `flows`     - Strategy entry points on `StrategyRunner`
//!
//! ## Usage
//!
//! ```bash
//! yieldex rebalance --wallet 0x.. --chain 42161 --from 0x.. --to 0x.. --mode plan
//! yieldex unwind --wallet 0x.. --chain 42161 --chain 1 --mode execute
//! ```

pub mod flows;
pub mod planner;
pub mod retry;
pub mod scanner;
pub mod sequencer;

pub use flows::{CompoundLeg, StrategyRunner};
pub use planner::{ActionPlanner, PlannedStep};
pub use retry::{PollPolicy, RetryPolicy};
pub use scanner::PositionScanner;
pub use sequencer::{RunContext, StepSequencer};
