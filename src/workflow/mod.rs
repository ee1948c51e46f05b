pub mod cycle_ctx;
pub mod observer;
pub mod pause_coordinator;

pub use cycle_ctx::CycleCtx;
pub use observer::{timestamped, LogObserver, RunObserver, RunStatus};
pub use pause_coordinator::{PauseCoordinator, ResumeOutcome, RunState};
