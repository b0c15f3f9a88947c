//! Reading broker statements from xlsx and writing enriched copies.

pub mod reader;
pub mod writer;

pub use reader::{list_input_files, read_statement};
pub use writer::{output_path, write_statement};
