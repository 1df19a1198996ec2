use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IngredientInput {
    pub name: String,
    pub amount: f64,
    pub measurement: String,
    pub category: String,
}

/// `?prefix=` on the listing route.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct IngredientQuery {
    pub prefix: String,
}
