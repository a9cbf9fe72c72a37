//! Command-line front end for the conversion job.

pub mod cli;
pub mod logging;
pub mod run;
pub mod summary;
