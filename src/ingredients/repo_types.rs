use serde::{Deserialize, Serialize};

use crate::id::Id;

/// Catalogue entry used for ingredient autocompletion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    #[serde(rename = "_id")]
    pub id: Id,
    pub name: String,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub measurement: String,
    #[serde(default)]
    pub category: String,
}
