//! State module for tracking job progress
//!
//! `JobState` follows a submitted job from the moment it is queued until its
//! completion handler returns.

mod job_state;

pub use job_state::JobState;
