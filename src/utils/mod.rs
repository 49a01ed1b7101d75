pub mod collection_ext;
pub mod format;
pub mod string_ext;

pub use collection_ext::{diff_sets, group_by_ordered, unique_ordered};
pub use format::{format_blocks, format_bytes, format_duration_ms};
pub use string_ext::{StringExt, is_identifier, strip_wrapping};
