//! Watches corporation structures for fuel depletion and posts threshold-crossing
//! warnings to Discord.

pub mod alerts;
pub mod check;
pub mod cli;
pub mod dispatch;
pub mod format;
pub mod interactions;
pub mod jobs;
pub mod model;
pub mod notify;
pub mod responder;
pub mod source;
pub mod status;
pub mod thresholds;
