//! Remote record shapes returned by the clinic backend.
//!
//! These types mirror the wire format, including its inconsistencies. They are
//! never authoritative: the backend owns every record and the client only holds
//! cached copies.

mod appointment;
mod billing;
mod cycle;
mod directory;
mod page;
mod patient;
mod sample;

pub use appointment::*;
pub use billing::*;
pub use cycle::*;
pub use directory::*;
pub use page::*;
pub use patient::*;
pub use sample::*;
