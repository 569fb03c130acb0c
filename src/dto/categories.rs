use serde::Serialize;

use crate::domain::category::{BuiltinCategory, Category};

/// Category entry as shown in navigation, filters and the admin registry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryDto {
    pub slug: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub tags: Vec<String>,
    /// Whether this entry comes from the built-in set (no database row).
    pub builtin: bool,
}

impl From<Category> for CategoryDto {
    fn from(value: Category) -> Self {
        Self {
            slug: value.slug.into_inner(),
            name: value.name.into_inner(),
            description: value.description.unwrap_or_default(),
            icon: value.icon,
            tags: value.tags,
            builtin: false,
        }
    }
}

impl From<&BuiltinCategory> for CategoryDto {
    fn from(value: &BuiltinCategory) -> Self {
        Self {
            slug: value.slug.to_string(),
            name: value.name.to_string(),
            description: value.description.to_string(),
            icon: value.icon.to_string(),
            tags: value.tags.iter().map(|t| t.to_string()).collect(),
            builtin: true,
        }
    }
}

impl CategoryDto {
    /// Case-insensitive match over slug, name, description and tags.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.slug.to_lowercase().contains(&query)
            || self.name.to_lowercase().contains(&query)
            || self.description.to_lowercase().contains(&query)
            || self.tags.iter().any(|tag| tag.to_lowercase().contains(&query))
    }
}
