use anyhow::Context;
use async_trait::async_trait;
use sqlx::{types::Json, FromRow, PgPool};
use time::Date;

use crate::households::repo_types::{Calendar, Household, WeekPlan};
use crate::id::Id;

#[async_trait]
pub trait HouseholdReader: Send + Sync {
    async fn get_household(&self, id: Id) -> anyhow::Result<Option<Household>>;
}

#[async_trait]
pub trait HouseholdWriter: Send + Sync {
    async fn insert_household(&self, household: Household) -> anyhow::Result<Household>;
    async fn delete_household(&self, id: Id) -> anyhow::Result<bool>;
}

pub trait HouseholdStore: HouseholdReader + HouseholdWriter {}

impl<T: HouseholdReader + HouseholdWriter + ?Sized> HouseholdStore for T {}

#[async_trait]
pub trait CalendarReader: Send + Sync {
    async fn calendar_by_id(&self, id: Id) -> anyhow::Result<Option<Calendar>>;
    /// Latest calendar of the household starting on `start_date`.
    async fn get_calendar(&self, household_id: Id, start_date: Date) -> anyhow::Result<Option<Calendar>>;
}

#[async_trait]
pub trait CalendarWriter: Send + Sync {
    async fn insert_calendar(&self, calendar: Calendar) -> anyhow::Result<Calendar>;
    /// Full-document replace keyed by id; inserts when absent.
    async fn replace_calendar(&self, calendar: &Calendar) -> anyhow::Result<()>;
}

pub trait CalendarStore: CalendarReader + CalendarWriter {}

impl<T: CalendarReader + CalendarWriter + ?Sized> CalendarStore for T {}

#[derive(Debug, FromRow)]
struct HouseholdRow {
    id: String,
    name: String,
    head_of_household: String,
}

impl TryFrom<HouseholdRow> for Household {
    type Error = anyhow::Error;

    fn try_from(r: HouseholdRow) -> anyhow::Result<Self> {
        Ok(Self {
            id: r.id.parse().context("household id")?,
            name: r.name,
            head_of_household: r.head_of_household.parse().context("head of household id")?,
        })
    }
}

#[derive(Debug, FromRow)]
struct CalendarRow {
    id: String,
    household_id: String,
    start_date: Date,
    days: Json<WeekPlan>,
}

impl TryFrom<CalendarRow> for Calendar {
    type Error = anyhow::Error;

    fn try_from(r: CalendarRow) -> anyhow::Result<Self> {
        Ok(Self {
            id: r.id.parse().context("calendar id")?,
            household_id: r.household_id.parse().context("calendar household id")?,
            start_date: r.start_date,
            days: r.days.0,
        })
    }
}

#[derive(Clone)]
pub struct PgHouseholdStore {
    db: PgPool,
}

impl PgHouseholdStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl HouseholdReader for PgHouseholdStore {
    async fn get_household(&self, id: Id) -> anyhow::Result<Option<Household>> {
        sqlx::query_as::<_, HouseholdRow>(
            "SELECT id, name, head_of_household FROM households WHERE id = $1",
        )
        .bind(id.to_hex())
        .fetch_optional(&self.db)
        .await
        .context("select household by id")?
        .map(Household::try_from)
        .transpose()
    }
}

#[async_trait]
impl HouseholdWriter for PgHouseholdStore {
    async fn insert_household(&self, household: Household) -> anyhow::Result<Household> {
        sqlx::query("INSERT INTO households (id, name, head_of_household) VALUES ($1, $2, $3)")
            .bind(household.id.to_hex())
            .bind(&household.name)
            .bind(household.head_of_household.to_hex())
            .execute(&self.db)
            .await
            .context("insert household")?;
        Ok(household)
    }

    async fn delete_household(&self, id: Id) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM households WHERE id = $1")
            .bind(id.to_hex())
            .execute(&self.db)
            .await
            .context("delete household")?;
        Ok(result.rows_affected() == 1)
    }
}

#[derive(Clone)]
pub struct PgCalendarStore {
    db: PgPool,
}

impl PgCalendarStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CalendarReader for PgCalendarStore {
    async fn calendar_by_id(&self, id: Id) -> anyhow::Result<Option<Calendar>> {
        sqlx::query_as::<_, CalendarRow>(
            "SELECT id, household_id, start_date, days FROM calendars WHERE id = $1",
        )
        .bind(id.to_hex())
        .fetch_optional(&self.db)
        .await
        .context("select calendar by id")?
        .map(Calendar::try_from)
        .transpose()
    }

    async fn get_calendar(&self, household_id: Id, start_date: Date) -> anyhow::Result<Option<Calendar>> {
        sqlx::query_as::<_, CalendarRow>(
            r#"
            SELECT id, household_id, start_date, days
              FROM calendars
             WHERE household_id = $1 AND start_date = $2
             ORDER BY id DESC
             LIMIT 1
            "#,
        )
        .bind(household_id.to_hex())
        .bind(start_date)
        .fetch_optional(&self.db)
        .await
        .context("select calendar")?
        .map(Calendar::try_from)
        .transpose()
    }
}

#[async_trait]
impl CalendarWriter for PgCalendarStore {
    async fn insert_calendar(&self, calendar: Calendar) -> anyhow::Result<Calendar> {
        sqlx::query(
            "INSERT INTO calendars (id, household_id, start_date, days) VALUES ($1, $2, $3, $4)",
        )
        .bind(calendar.id.to_hex())
        .bind(calendar.household_id.to_hex())
        .bind(calendar.start_date)
        .bind(Json(&calendar.days))
        .execute(&self.db)
        .await
        .context("insert calendar")?;
        Ok(calendar)
    }

    async fn replace_calendar(&self, calendar: &Calendar) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO calendars (id, household_id, start_date, days)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE SET
                household_id = EXCLUDED.household_id,
                start_date = EXCLUDED.start_date,
                days = EXCLUDED.days
            "#,
        )
        .bind(calendar.id.to_hex())
        .bind(calendar.household_id.to_hex())
        .bind(calendar.start_date)
        .bind(Json(&calendar.days))
        .execute(&self.db)
        .await
        .context("replace calendar")?;
        Ok(())
    }
}
