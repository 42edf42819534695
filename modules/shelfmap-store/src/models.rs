use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A canonical brand. `normalized_name` (lowercase, trimmed) is the primary
/// lookup key and is unique across active and inactive rows.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Brand {
    pub id: Uuid,
    pub canonical_name: String,
    pub normalized_name: String,
    pub aliases: Vec<String>,
    pub is_verified: bool,
    pub popularity_score: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A node in the category tree. Max depth two: roots (`level` 0, no parent)
/// and children (`level` 1). `path` lists ancestor ids from root to parent,
/// so `level == path.len()` always holds.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub parent_id: Option<Uuid>,
    pub level: i32,
    pub path: Vec<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// One platform's category string mapped onto the canonical tree.
/// Unique per `(platform_id, platform_category lowercased)`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CategoryMapping {
    pub id: Uuid,
    pub platform_id: Uuid,
    pub platform_category: String,
    pub target_category_id: Uuid,
    pub target_subcategory_id: Option<Uuid>,
    pub mapping_type: String,
    pub confidence: f64,
    pub is_verified: bool,
    pub usage_count: i32,
    pub last_used_at: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Clean an alias list for persistence: trim entries, drop empties and
/// exact duplicates, and drop anything equal to the brand's normalized
/// name (aliases never shadow the primary key).
pub fn clean_aliases(normalized_name: &str, aliases: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    aliases
        .iter()
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty() && a != normalized_name && seen.insert(a.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_aliases_drops_empties_duplicates_and_the_normalized_name() {
        let aliases = vec![
            "  HP Inc ".to_string(),
            "hewlett-packard".to_string(),
            "HP Inc".to_string(),
            "".to_string(),
            "hp".to_string(),
        ];
        let cleaned = clean_aliases("hp", &aliases);
        assert_eq!(cleaned, vec!["HP Inc".to_string(), "hewlett-packard".to_string()]);
    }

    #[test]
    fn category_root_has_level_zero_invariant_shape() {
        let root = Category {
            id: Uuid::new_v4(),
            name: "Electronics".to_string(),
            parent_id: None,
            level: 0,
            path: vec![],
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(root.is_root());
        assert_eq!(root.level as usize, root.path.len());
    }
}
