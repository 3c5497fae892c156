//! Workflow gating for treatment cycles and lab samples.
//!
//! Pure functions only. Nothing here talks to the backend.

mod eligibility;
mod inference;
mod progress;
mod step;

pub use eligibility::*;
pub use inference::*;
pub use progress::*;
pub use step::*;
