//! Background Tasks Module
//!
//! # Tasks
//! - Expiry sweeper: drops expired buckets from the memory store

mod sweeper;

pub use sweeper::spawn_expiry_sweeper;
