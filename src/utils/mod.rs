pub mod text_processor;
pub mod tools;

pub use text_processor::{escape_xml, sanitize_stem};
pub use tools::ExternalTool;
