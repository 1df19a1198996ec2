use serde::Deserialize;
use time::Date;

use crate::households::repo_types::WeekPlan;
use crate::id::Id;

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateHouseholdRequest {
    #[serde(rename = "householdName")]
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AddMemberRequest {
    pub user_name: String,
}

/// Body of `POST /calendars`, and the `?startDate=` query of `GET /calendars`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarDate {
    #[serde(with = "iso_date")]
    pub start_date: Date,
}

/// Full calendar replacement. Without an id a new calendar is stored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarInput {
    #[serde(rename = "_id", default)]
    pub id: Option<Id>,
    #[serde(with = "iso_date")]
    pub start_date: Date,
    #[serde(flatten)]
    pub days: WeekPlan,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calendar_date_parses_iso_day() {
        let d: CalendarDate = serde_json::from_str(r#"{"startDate": "2024-03-03"}"#).unwrap();
        assert_eq!(d.start_date, time::macros::date!(2024 - 03 - 03));
        assert!(serde_json::from_str::<CalendarDate>(r#"{"startDate": "03/03/2024"}"#).is_err());
    }
}
