use chrono::Utc;
use serde::Deserialize;
use thiserror::Error;
use validator::{Validate, ValidationErrors};

use crate::domain::category::{CategoryUpdate, NewCategory};
use crate::domain::types::{CategoryName, CategorySlug, TypeConstraintError};
use crate::forms::normalize_optional;

fn parse_tags(value: Option<String>) -> Vec<String> {
    value
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|tag| !tag.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[derive(Deserialize, Validate)]
pub struct CreateCategoryForm {
    /// Slug defaults to the normalised display name when absent.
    pub slug: Option<String>,
    #[validate(length(min = 1))]
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    /// Comma-separated search tags.
    pub tags: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateCategoryFormPayload {
    pub slug: CategorySlug,
    pub name: CategoryName,
    pub description: Option<String>,
    pub icon: String,
    pub tags: Vec<String>,
}

impl CreateCategoryFormPayload {
    pub fn into_new_category(self) -> NewCategory {
        let now = Utc::now().naive_utc();
        NewCategory {
            slug: self.slug,
            name: self.name,
            description: self.description,
            icon: self.icon,
            tags: self.tags,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Error)]
pub enum CreateCategoryFormError {
    #[error("Category form validation failed: {0}")]
    Validation(String),
    #[error("Category form contains invalid data: {0}")]
    TypeConstraint(String),
}

impl From<ValidationErrors> for CreateCategoryFormError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value.to_string())
    }
}

impl From<TypeConstraintError> for CreateCategoryFormError {
    fn from(value: TypeConstraintError) -> Self {
        Self::TypeConstraint(value.to_string())
    }
}

impl TryFrom<CreateCategoryForm> for CreateCategoryFormPayload {
    type Error = CreateCategoryFormError;

    fn try_from(value: CreateCategoryForm) -> Result<Self, Self::Error> {
        value.validate()?;

        let slug = match normalize_optional(value.slug) {
            Some(slug) => CategorySlug::new(slug)?,
            None => CategorySlug::new(value.name.clone())?,
        };

        Ok(Self {
            slug,
            name: CategoryName::new(value.name)?,
            description: normalize_optional(value.description),
            icon: normalize_optional(value.icon).unwrap_or_default(),
            tags: parse_tags(value.tags),
        })
    }
}

#[derive(Deserialize, Validate)]
pub struct EditCategoryForm {
    #[validate(length(min = 1))]
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub tags: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EditCategoryFormPayload {
    pub name: CategoryName,
    pub description: Option<String>,
    pub icon: String,
    pub tags: Vec<String>,
}

impl EditCategoryFormPayload {
    pub fn into_category_update(self) -> CategoryUpdate {
        CategoryUpdate {
            name: self.name,
            description: self.description,
            icon: self.icon,
            tags: self.tags,
        }
    }
}

#[derive(Debug, Error)]
pub enum EditCategoryFormError {
    #[error("Category form validation failed: {0}")]
    Validation(String),
    #[error("Category form contains invalid data: {0}")]
    TypeConstraint(String),
}

impl From<ValidationErrors> for EditCategoryFormError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value.to_string())
    }
}

impl From<TypeConstraintError> for EditCategoryFormError {
    fn from(value: TypeConstraintError) -> Self {
        Self::TypeConstraint(value.to_string())
    }
}

impl TryFrom<EditCategoryForm> for EditCategoryFormPayload {
    type Error = EditCategoryFormError;

    fn try_from(value: EditCategoryForm) -> Result<Self, Self::Error> {
        value.validate()?;
        Ok(Self {
            name: CategoryName::new(value.name)?,
            description: normalize_optional(value.description),
            icon: normalize_optional(value.icon).unwrap_or_default(),
            tags: parse_tags(value.tags),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_defaults_to_normalized_name() {
        let form = CreateCategoryForm {
            slug: None,
            name: "Pest Control".to_string(),
            description: None,
            icon: None,
            tags: Some("rats, wasps , ".to_string()),
        };
        let payload: CreateCategoryFormPayload = form.try_into().unwrap();
        assert_eq!(payload.slug.as_str(), "pest-control");
        assert_eq!(payload.tags, vec!["rats".to_string(), "wasps".to_string()]);
    }

    #[test]
    fn explicit_slug_is_normalized() {
        let form = CreateCategoryForm {
            slug: Some(" Pest  CONTROL ".to_string()),
            name: "Pest Control".to_string(),
            description: None,
            icon: None,
            tags: None,
        };
        let payload: CreateCategoryFormPayload = form.try_into().unwrap();
        assert_eq!(payload.slug.as_str(), "pest-control");
        assert!(payload.tags.is_empty());
    }
}
