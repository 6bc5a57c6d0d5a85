//! Binary decoding: the byte reader and one parser per header in the file.

pub mod exth;
pub mod mobi;
pub mod palmdb;
pub mod palmdoc;
pub mod reader;
