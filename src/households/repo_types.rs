use serde::{Deserialize, Serialize};
use time::Date;

use crate::id::Id;
use crate::recipes::repo_types::Recipe;

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Household {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(rename = "householdName")]
    pub name: String,
    /// Id of the user who created the household.
    pub head_of_household: Id,
}

/// One recipe per weekday, Sunday first. Every slot is always filled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekPlan {
    pub sunday: Recipe,
    pub monday: Recipe,
    pub tuesday: Recipe,
    pub wednesday: Recipe,
    pub thursday: Recipe,
    pub friday: Recipe,
    pub saturday: Recipe,
}

impl WeekPlan {
    pub const DAYS: usize = 7;

    /// Assigns recipes to Sunday..Saturday in the given order.
    /// Returns the input back unless it holds exactly seven recipes.
    pub fn from_draw(recipes: Vec<Recipe>) -> Result<Self, Vec<Recipe>> {
        let [sunday, monday, tuesday, wednesday, thursday, friday, saturday] =
            <[Recipe; Self::DAYS]>::try_from(recipes)?;
        Ok(Self {
            sunday,
            monday,
            tuesday,
            wednesday,
            thursday,
            friday,
            saturday,
        })
    }

    pub fn days(&self) -> [&Recipe; Self::DAYS] {
        [
            &self.sunday,
            &self.monday,
            &self.tuesday,
            &self.wednesday,
            &self.thursday,
            &self.friday,
            &self.saturday,
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Calendar {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(rename = "householdID")]
    pub household_id: Id,
    #[serde(with = "iso_date")]
    pub start_date: Date,
    #[serde(flatten)]
    pub days: WeekPlan,
}
