use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::id::Id;

/// An ingredient line inside a recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeIngredient {
    pub name: String,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub measurement: String, // cups, tbsp, lbs...
    #[serde(default)]
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub number: u32,
    pub text: String,
}

/// Recipe document. Field names on the wire follow the cookbook client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(rename = "recipeName")]
    pub name: String,
    #[serde(rename = "createdDate", with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(rename = "lastUpdatedDate", with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    /// Username of the account that created the recipe; only it may change it.
    #[serde(rename = "userName")]
    pub owner: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<RecipeIngredient>,
    #[serde(default)]
    pub steps: Vec<Step>,
    #[serde(default)]
    pub prep_time: i32,
    #[serde(default)]
    pub cook_time: i32,
    #[serde(default)]
    pub servings: i32,
    #[serde(default)]
    pub calories: i32,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub private: bool,
}

/// Query applied to recipe listings. Both parts are optional and ANDed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeFilter {
    /// Case-insensitive substring of the recipe name.
    #[serde(default, rename = "recipeName")]
    pub name: Option<String>,
    /// Every listed tag must be present on the recipe.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl RecipeFilter {
    pub fn name_fragment(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    pub fn matches(&self, recipe: &Recipe) -> bool {
        let fragment = self.name_fragment().to_lowercase();
        let name_ok = fragment.is_empty() || recipe.name.to_lowercase().contains(&fragment);
        name_ok && self.tags.iter().all(|t| recipe.tags.contains(t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipe(name: &str, tags: &[&str]) -> Recipe {
        let now = OffsetDateTime::now_utc();
        Recipe {
            id: Id::new(),
            name: name.into(),
            created_at: now,
            updated_at: now,
            owner: "alice".into(),
            author: None,
            ingredients: vec![],
            steps: vec![],
            prep_time: 0,
            cook_time: 0,
            servings: 2,
            calories: 0,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            private: false,
        }
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(RecipeFilter::default().matches(&recipe("Shakshuka", &[])));
    }

    #[test]
    fn name_match_is_case_insensitive_substring() {
        let filter = RecipeFilter { name: Some("CURRY".into()), tags: vec![] };
        assert!(filter.matches(&recipe("Green curry with tofu", &[])));
        assert!(!filter.matches(&recipe("Pad thai", &[])));
    }

    #[test]
    fn all_tags_must_be_present_and_combine_with_name() {
        let filter = RecipeFilter {
            name: Some("soup".into()),
            tags: vec!["vegan".into(), "quick".into()],
        };
        assert!(filter.matches(&recipe("Lentil soup", &["quick", "vegan", "winter"])));
        assert!(!filter.matches(&recipe("Lentil soup", &["vegan"])));
        assert!(!filter.matches(&recipe("Lentil stew", &["quick", "vegan"])));
    }

    #[test]
    fn wire_names_follow_client_fields() {
        let json = serde_json::to_value(recipe("Ramen", &["noodles"])).unwrap();
        assert_eq!(json["recipeName"], "Ramen");
        assert_eq!(json["userName"], "alice");
        assert!(json["_id"].as_str().is_some_and(|s| s.len() == 24));
        assert!(json["createdDate"].is_string());
        assert!(json.get("author").is_none());
    }
}
