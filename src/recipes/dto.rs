use serde::{Deserialize, Serialize};

use crate::recipes::repo_types::{Recipe, RecipeFilter, RecipeIngredient, Step};

/// Client-editable part of a recipe. Id, timestamps and owner are set by the
/// server.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecipeInput {
    #[serde(rename = "recipeName")]
    pub name: String,
    pub author: Option<String>,
    pub ingredients: Vec<RecipeIngredient>,
    pub steps: Vec<Step>,
    pub prep_time: i32,
    pub cook_time: i32,
    pub servings: i32,
    pub calories: i32,
    pub tags: Vec<String>,
    pub private: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationRequest {
    pub page_size: u32,
    /// Pages to advance past the first one; 0 is the first page.
    #[serde(default)]
    pub page_count: u32,
    #[serde(default)]
    pub query_recipe: RecipeFilter,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationResponse {
    pub page_size: u32,
    pub page_count: u32,
    pub number_of_recipes: u64,
    pub recipes: Vec<Recipe>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_request_uses_client_field_names() {
        let req: PaginationRequest = serde_json::from_str(
            r#"{"pageSize": 5, "pageCount": 2, "queryRecipe": {"recipeName": "soup", "tags": ["vegan"]}}"#,
        )
        .unwrap();
        assert_eq!(req.page_size, 5);
        assert_eq!(req.page_count, 2);
        assert_eq!(req.query_recipe.name.as_deref(), Some("soup"));
        assert_eq!(req.query_recipe.tags, vec!["vegan".to_string()]);
    }

    #[test]
    fn query_defaults_to_everything() {
        let req: PaginationRequest = serde_json::from_str(r#"{"pageSize": 10}"#).unwrap();
        assert_eq!(req.page_count, 0);
        assert_eq!(req.query_recipe, RecipeFilter::default());
    }

    #[test]
    fn recipe_input_ignores_server_fields() {
        let input: RecipeInput = serde_json::from_str(
            r#"{"recipeName": "Dal", "userName": "mallory", "prepTime": 10, "tags": ["lentils"]}"#,
        )
        .unwrap();
        assert_eq!(input.name, "Dal");
        assert_eq!(input.prep_time, 10);
        assert_eq!(input.tags, vec!["lentils".to_string()]);
    }
}
