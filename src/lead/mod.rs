mod client;
mod contact;
mod diagnostic;
mod queue;
mod worklist;

pub use client::{AssignmentStatus, ClientRecord, ContactChannel, ContactStatus, DATE_FORMAT};
pub use contact::{ContactForm, ContactStateMachine};
pub use diagnostic::{ReasonSet, describe};
pub use queue::{LeadQueue, Offer, QueueRule};
pub use worklist::{StatusBadge, WorklistRow, worklist};
