//! Infrastructure - ports and their in-process adapters.

pub mod clock;
pub mod memory;
pub mod ports;
