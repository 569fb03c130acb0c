use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::{CategoryId, CategoryName, CategorySlug};

/// Admin-registered category record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub slug: CategorySlug,
    pub name: CategoryName,
    pub description: Option<String>,
    pub icon: String,
    pub tags: Vec<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Data required to insert a new [`Category`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewCategory {
    pub slug: CategorySlug,
    pub name: CategoryName,
    pub description: Option<String>,
    pub icon: String,
    pub tags: Vec<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Mutable fields of an existing category.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryUpdate {
    pub name: CategoryName,
    pub description: Option<String>,
    pub icon: String,
    pub tags: Vec<String>,
}

/// Built-in category definition shipped with the application.
///
/// The public registry merges these with admin-registered rows; a database
/// row whose slug matches a built-in overrides it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuiltinCategory {
    pub slug: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub tags: &'static [&'static str],
}

/// The fixed category set every deployment starts with.
pub const BUILTIN_CATEGORIES: &[BuiltinCategory] = &[
    BuiltinCategory {
        slug: "cleaning",
        name: "Cleaning Services",
        description: "Professional cleaning for homes, offices, and commercial spaces",
        icon: "brush-fill",
        tags: &["house cleaning", "office cleaning", "deep cleaning", "maid service"],
    },
    BuiltinCategory {
        slug: "plumbing",
        name: "Plumbing Services",
        description: "Licensed plumbers for repairs, installations, and maintenance",
        icon: "wrench-adjustable-circle-fill",
        tags: &["pipe repair", "leak fixing", "drain cleaning", "water heater"],
    },
    BuiltinCategory {
        slug: "electrical",
        name: "Electrical Services",
        description: "Certified electricians for wiring, repairs, and installations",
        icon: "lightning-charge-fill",
        tags: &["wiring", "lighting", "circuit breaker", "electrical repair"],
    },
    BuiltinCategory {
        slug: "painting",
        name: "Painting Services",
        description: "Professional painters for interior and exterior projects",
        icon: "palette2",
        tags: &["interior painting", "exterior painting", "wall painting", "house painter"],
    },
    BuiltinCategory {
        slug: "carpentry",
        name: "Carpentry Services",
        description: "Skilled carpenters for custom woodwork and furniture",
        icon: "hammer",
        tags: &["furniture assembly", "cabinet installation", "wood repair", "custom woodwork"],
    },
    BuiltinCategory {
        slug: "landscaping",
        name: "Landscaping",
        description: "Landscape design and lawn care",
        icon: "flower2",
        tags: &["lawn mowing", "landscaping", "tree trimming", "garden maintenance"],
    },
    BuiltinCategory {
        slug: "hvac",
        name: "HVAC Services",
        description: "Heating, ventilation, and air conditioning experts",
        icon: "snow2",
        tags: &["ac repair", "heating", "ventilation", "hvac maintenance"],
    },
    BuiltinCategory {
        slug: "other",
        name: "Other Services",
        description: "Miscellaneous services not listed",
        icon: "three-dots",
        tags: &["misc", "general"],
    },
];

/// Look up a built-in category by slug.
pub fn builtin_category(slug: &str) -> Option<&'static BuiltinCategory> {
    BUILTIN_CATEGORIES.iter().find(|c| c.slug == slug)
}
