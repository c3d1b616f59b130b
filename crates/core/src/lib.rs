//! Domain types for the addition service.
//!
//! Holds the operand parsing rules and the job description handed to the
//! compute network. Nothing here performs I/O.

pub mod error;
pub mod job;
pub mod operands;
