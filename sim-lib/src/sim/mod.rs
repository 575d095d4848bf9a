//! Decision engine of the simulated disk reads.

mod elapsed;
mod orchestrator;
mod outcome;
mod queue;
mod random;
mod result;

pub use self::{
    elapsed::{ReadPlan, plan_read, reclassify_after_service, simulate_read},
    orchestrator::Simulator,
    outcome::OutcomeClass,
    queue::QueueWait,
    random::{VariateSource, VariateStream},
    result::{ReadResult, ReadStatus},
};
