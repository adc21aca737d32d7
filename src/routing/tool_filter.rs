use rmcp::model::Tool;
use std::collections::BTreeSet;

/// Set of tool names permitted through the wrapper.
///
/// Duplicate names collapse on construction; order carries no meaning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowList {
    names: BTreeSet<String>,
}

impl AllowList {
    /// Check if a tool name is allowed
    pub fn allows(&self, tool_name: &str) -> bool {
        self.names.contains(tool_name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for AllowList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Keep the tools whose name is allowed, preserving upstream order
pub fn filter_tools(catalog: &[Tool], allow: &AllowList) -> Vec<Tool> {
    catalog
        .iter()
        .filter(|tool| allow.allows(&tool.name))
        .cloned()
        .collect()
}

/// Allowed names that match no tool in the catalog
pub fn unmatched_names<'a>(catalog: &[Tool], allow: &'a AllowList) -> Vec<&'a str> {
    allow
        .iter()
        .filter(|name| !catalog.iter().any(|tool| tool.name == *name))
        .collect()
}
