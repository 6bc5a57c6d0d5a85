//! Decoded header types for PalmDB containers and the MOBI headers inside record 0.

pub mod analysis;
pub mod palmdb;
pub mod record0;
