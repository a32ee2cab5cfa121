//! Domain entities: the node capability and the record type used by the CLI

use std::fmt;

use serde::{Deserialize, Serialize};

/// Capabilities a caller's entity must expose to be arranged in a [`Forest`].
///
/// Structure (parent and children) lives in the forest, not in the entity.
/// The entity only carries its identity, the parent id it declares, and its
/// sibling order number.
///
/// [`Forest`]: crate::domain::Forest
pub trait TreeEntity {
    /// Unique, stable identifier.
    fn id(&self) -> &str;

    /// Declared parent id, `None` for roots.
    fn parent_id(&self) -> Option<&str>;

    /// Overwrite the declared parent id.
    fn set_parent_id(&mut self, parent_id: Option<String>);

    /// Sibling order number, ascending.
    fn order_num(&self) -> i32;
}

/// A plain hierarchical record, as read from a record file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub order_num: i32,
    /// Display name, falls back to the id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Record {
    pub fn new(id: impl Into<String>, parent_id: Option<&str>, order_num: i32) -> Self {
        Self {
            id: id.into(),
            parent_id: parent_id.map(str::to_string),
            order_num,
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl TreeEntity for Record {
    fn id(&self) -> &str {
        &self.id
    }

    fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }

    fn set_parent_id(&mut self, parent_id: Option<String>) {
        self.parent_id = parent_id;
    }

    fn order_num(&self) -> i32 {
        self.order_num
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} [{}]", name, self.id),
            None => write!(f, "{}", self.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_record_with_name_when_displayed_then_shows_name_and_id() {
        let record = Record::new("a", None, 1).with_name("Root");
        assert_eq!(record.to_string(), "Root [a]");
    }

    #[test]
    fn given_record_without_name_when_displayed_then_shows_id() {
        assert_eq!(Record::new("b", Some("a"), 2).to_string(), "b");
    }

    #[test]
    fn given_toml_without_optional_fields_when_parsed_then_defaults_apply() {
        let record: Record = toml::from_str(r#"id = "x""#).unwrap();
        assert_eq!(record.parent_id, None);
        assert_eq!(record.order_num, 0);
        assert_eq!(record.name, None);
    }
}
