//! Job dispatch orchestration.
//!
//! [`orchestrator::ComputePipeline`] runs one addition request end to end:
//! build the job, submit it, wait for completion, fetch its results into a
//! per-request [`workspace::Workspace`], read `stdout`, release the
//! workspace. The compute network and artifact store are reached through
//! the traits in [`collaborators`].

pub mod collaborators;
pub mod orchestrator;
pub mod wait;
pub mod workspace;

#[cfg(test)]
mod fakes;
