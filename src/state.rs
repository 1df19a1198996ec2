use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::households::repo::{CalendarStore, HouseholdStore, PgCalendarStore, PgHouseholdStore};
use crate::ingredients::repo::{IngredientStore, PgIngredientStore};
use crate::mailer::{Mailer, Outbox, SmtpMailer};
use crate::memory::MemoryStore;
use crate::recipes::repo::{PgRecipeStore, RecipeStore};
use crate::users::repo::{PgUserStore, UserStore};

#[async_trait]
pub trait StoreHealth: Send + Sync {
    async fn ping(&self) -> anyhow::Result<()>;
}

#[async_trait]
impl StoreHealth for PgPool {
    async fn ping(&self) -> anyhow::Result<()> {
        sqlx::query("SELECT 1")
            .execute(self)
            .await
            .context("ping database")?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserStore>,
    pub recipes: Arc<dyn RecipeStore>,
    pub ingredients: Arc<dyn IngredientStore>,
    pub households: Arc<dyn HouseholdStore>,
    pub calendars: Arc<dyn CalendarStore>,
    pub mailer: Arc<dyn Mailer>,
    pub health: Arc<dyn StoreHealth>,
}

impl AppState {
    /// Connects to Postgres and runs migrations when a database is configured,
    /// otherwise falls back to the in-memory store and outbox mailer.
    pub async fn init(config: &AppConfig) -> anyhow::Result<Self> {
        let config = Arc::new(config.clone());
        let Some(url) = config.database_url.as_deref() else {
            warn!("DATABASE_URL not set; using in-memory store and outbox mailer");
            return Ok(Self::in_memory(config, Arc::new(Outbox::default())));
        };

        let db = sqlx::postgres::PgPoolOptions::new()
            .max_connections(10)
            .connect(url)
            .await
            .context("connect to database")?;
        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .context("run migrations")?;
        info!("database ready");

        let mailer = Arc::new(SmtpMailer::new(&config.mail)?) as Arc<dyn Mailer>;
        Ok(Self::from_pool(db, config, mailer))
    }

    pub fn from_pool(db: PgPool, config: Arc<AppConfig>, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            config,
            users: Arc::new(PgUserStore::new(db.clone())),
            recipes: Arc::new(PgRecipeStore::new(db.clone())),
            ingredients: Arc::new(PgIngredientStore::new(db.clone())),
            households: Arc::new(PgHouseholdStore::new(db.clone())),
            calendars: Arc::new(PgCalendarStore::new(db.clone())),
            mailer,
            health: Arc::new(db),
        }
    }

    pub fn in_memory(config: Arc<AppConfig>, mailer: Arc<dyn Mailer>) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            config,
            users: store.clone(),
            recipes: store.clone(),
            ingredients: store.clone(),
            households: store.clone(),
            calendars: store.clone(),
            mailer,
            health: store,
        }
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        Self::in_memory(Arc::new(AppConfig::default()), Arc::new(Outbox::default()))
    }
}
