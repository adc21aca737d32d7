pub mod tool_filter;

pub use tool_filter::{filter_tools, unmatched_names, AllowList};
