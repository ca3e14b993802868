//! Permission definitions.

use serde::{Deserialize, Serialize};

/// A named permission that plugins can register and decide on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    /// Unique permission name, e.g. `"view-table"`.
    pub name: String,
    /// Unique short form, e.g. `"vt"`.
    #[serde(default)]
    pub abbr: Option<String>,
    /// Human description.
    #[serde(default)]
    pub description: Option<String>,
    /// Whether the permission is scoped to a database.
    #[serde(default)]
    pub takes_database: bool,
    /// Whether the permission is scoped to a resource inside a database.
    #[serde(default)]
    pub takes_resource: bool,
    /// Value used when every implementation abstains.
    #[serde(default)]
    pub default: bool,
}

impl Permission {
    /// Creates a permission with no scope and a deny default.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            abbr: None,
            description: None,
            takes_database: false,
            takes_resource: false,
            default: false,
        }
    }

    /// Sets the abbreviation.
    pub fn with_abbr(mut self, abbr: impl Into<String>) -> Self {
        self.abbr = Some(abbr.into());
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the database / resource scoping flags.
    pub fn scoped(mut self, takes_database: bool, takes_resource: bool) -> Self {
        self.takes_database = takes_database;
        self.takes_resource = takes_resource;
        self
    }

    /// Sets the default grant.
    pub fn with_default(mut self, default: bool) -> Self {
        self.default = default;
        self
    }
}

/// The thing a permission check is about.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Resource {
    /// A whole database.
    Database(String),
    /// A table, view, or canned query inside a database.
    Child(String, String),
}

impl Resource {
    /// Database the resource lives in.
    pub fn database(&self) -> &str {
        match self {
            Self::Database(db) | Self::Child(db, _) => db,
        }
    }

    /// Name of the resource inside the database, if any.
    pub fn child(&self) -> Option<&str> {
        match self {
            Self::Database(_) => None,
            Self::Child(_, child) => Some(child),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let perm = Permission::new("view-table")
            .with_abbr("vt")
            .with_description("View table")
            .scoped(true, true)
            .with_default(true);
        assert_eq!(perm.abbr.as_deref(), Some("vt"));
        assert!(perm.takes_database && perm.takes_resource && perm.default);
    }

    #[test]
    fn test_resource_serializes_as_string_or_pair() {
        let db = serde_json::to_value(Resource::Database("fixtures".into())).expect("ser");
        assert_eq!(db, serde_json::json!("fixtures"));
        let table = Resource::Child("fixtures".into(), "facetable".into());
        assert_eq!(
            serde_json::to_value(&table).expect("ser"),
            serde_json::json!(["fixtures", "facetable"])
        );
        assert_eq!(table.database(), "fixtures");
        assert_eq!(table.child(), Some("facetable"));
    }
}
