pub mod path;
pub mod string;

pub use path::find_executable;
pub use string::{format_output, trim_trailing_newlines};
