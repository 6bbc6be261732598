// src/enroll/mod.rs

mod acquire;
mod resolver;
mod scheduler;
mod submit;

pub use acquire::acquire_course;
pub use resolver::{resolve_slot, select_candidate};
pub use scheduler::{Scheduler, Stage};
pub use submit::{SubmissionReport, submit_to_channels};
