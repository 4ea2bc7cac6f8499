pub mod document_reader;

pub use document_reader::DocumentReader;
