pub mod coordinator;
pub mod error;
pub mod state;
pub mod submit;

pub use coordinator::{RunCoordinator, RunOptions, RunStatus, RunSummary};
pub use error::RunnerError;
pub use state::RunStateStore;
pub use submit::{BackendClient, Submitter};
