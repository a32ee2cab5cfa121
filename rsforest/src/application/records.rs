//! Record files: TOML documents listing hierarchical records
//!
//! ```toml
//! [[node]]
//! id = "a"
//! order_num = 1
//! name = "Root"
//!
//! [[node]]
//! id = "b"
//! parent_id = "a"
//! order_num = 2
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::Record;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFile {
    #[serde(rename = "node", default)]
    pub nodes: Vec<Record>,
}

impl RecordFile {
    /// Parse record file content; `path` is only used for error messages.
    pub fn parse(content: &str, path: &Path) -> ApplicationResult<Self> {
        toml::from_str(content).map_err(|e| ApplicationError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Serialize back to TOML, e.g. after parent ids were restamped.
    pub fn to_toml(&self) -> ApplicationResult<String> {
        toml::to_string(self).map_err(|e| ApplicationError::OperationFailed {
            context: "serialize records".to_string(),
            source: Box::new(e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_node_tables_when_parsing_then_records_in_file_order() {
        let content = r#"
[[node]]
id = "a"
order_num = 1

[[node]]
id = "b"
parent_id = "a"
"#;
        let file = RecordFile::parse(content, Path::new("t.toml")).unwrap();

        assert_eq!(
            file.nodes,
            vec![Record::new("a", None, 1), Record::new("b", Some("a"), 0)]
        );
    }

    #[test]
    fn given_node_without_id_when_parsing_then_parse_error_names_path() {
        let err = RecordFile::parse("[[node]]\norder_num = 1\n", Path::new("bad.toml")).unwrap_err();
        assert!(err.to_string().contains("bad.toml"));
    }

    #[test]
    fn given_empty_content_when_parsing_then_no_records() {
        let file = RecordFile::parse("", Path::new("empty.toml")).unwrap();
        assert!(file.nodes.is_empty());
    }
}
