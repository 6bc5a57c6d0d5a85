//! `mobiscope`: inspect and compare the headers of MOBI e-books.
//!
//! This crate decodes the container and metadata layers of a MOBI file
//! (PalmDB header, record list, PalmDOC header, MOBI header and EXTH header)
//! into plain structs, and compares selected fields between two files.

pub mod analyzer;
pub mod compare;
pub mod config;
pub mod error;
pub mod model;
pub mod parser;
pub mod report;
