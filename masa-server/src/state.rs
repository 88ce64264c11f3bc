//! Application state

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;

use crate::config::Config;
use crate::live::OrderFeedHub;
use crate::orders::OrderLedger;
use crate::pricing::PricingConfig;
use crate::store::{Catalog, OrderStore, PgStore};
use crate::stripe::StripeClient;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool
    pub pool: PgPool,
    /// Read-only menu catalog
    pub catalog: Arc<dyn Catalog>,
    /// Order ledger (single source of truth for order state)
    pub ledger: Arc<OrderLedger>,
    /// Real-time order feed
    pub feed: OrderFeedHub,
    /// Stripe REST client
    pub stripe: StripeClient,
    /// Server configuration
    pub config: Config,
}

impl AppState {
    /// Create a new AppState: connect the pool, run migrations, wire services
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database connected, migrations applied");

        let store = Arc::new(PgStore::new(pool.clone()));
        let feed = OrderFeedHub::new();
        let ledger = Arc::new(OrderLedger::new(
            store.clone() as Arc<dyn OrderStore>,
            feed.clone(),
        ));
        let stripe = StripeClient::new(config.stripe_secret_key.clone());

        Ok(Self {
            pool,
            catalog: store as Arc<dyn Catalog>,
            ledger,
            feed,
            stripe,
            config: config.clone(),
        })
    }

    /// Pricing parameters derived from the config
    pub fn pricing_config(&self) -> PricingConfig {
        PricingConfig {
            tax_rate: self.config.tax_rate,
            delivery_fee: self.config.delivery_fee,
        }
    }
}
