//! Server configuration

use rust_decimal::Decimal;
use std::str::FromStr;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Server configuration
///
/// All values come from environment variables (a `.env` file is loaded in
/// `main`). Stripe secrets must be set outside development.
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL
    pub database_url: String,
    /// HTTP API port
    pub http_port: u16,
    /// Environment: development | staging | production
    pub environment: String,
    /// Sales tax rate applied to the subtotal (e.g. 0.08875)
    pub tax_rate: Decimal,
    /// Flat delivery fee in minor units
    pub delivery_fee: i64,
    /// Payment currency (ISO code, lowercase)
    pub currency: String,
    /// Stripe secret key
    pub stripe_secret_key: String,
    /// Stripe webhook signing secret
    pub stripe_webhook_secret: String,
    /// Stripe publishable key handed to checkout clients
    pub stripe_publishable_key: Option<String>,
    /// Whether a confirmed payment auto-advances `pending → preparing`
    /// (false = kitchen accepts manually)
    pub payment_auto_accept: bool,
}

impl Config {
    /// Require a secret env var: must be set and non-empty in non-development
    /// environments.
    fn require_secret(name: &str, environment: &str) -> Result<String, BoxError> {
        let val = match std::env::var(name) {
            Ok(v) => v,
            Err(_) => {
                if environment != "development" {
                    return Err(format!("{name} must be set in {environment} environment").into());
                }
                format!("dev-{name}-not-for-production")
            }
        };
        if val.is_empty() && environment != "development" {
            return Err(format!("{name} must not be empty in {environment} environment").into());
        }
        Ok(val)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let tax_rate = match std::env::var("TAX_RATE") {
            // NYC combined sales tax
            Err(_) => Decimal::new(8875, 5),
            Ok(raw) => Decimal::from_str(&raw)
                .map_err(|e| format!("TAX_RATE must be a decimal fraction: {e}"))?,
        };
        if tax_rate < Decimal::ZERO || tax_rate >= Decimal::ONE {
            return Err(format!("TAX_RATE out of range: {tax_rate}").into());
        }

        Ok(Self {
            database_url: std::env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set")?,
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            environment: environment.clone(),
            tax_rate,
            delivery_fee: std::env::var("DELIVERY_FEE_CENTS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(500),
            currency: std::env::var("CURRENCY").unwrap_or_else(|_| "usd".into()),
            stripe_secret_key: Self::require_secret("STRIPE_SECRET_KEY", &environment)?,
            stripe_webhook_secret: Self::require_secret("STRIPE_WEBHOOK_SECRET", &environment)?,
            stripe_publishable_key: std::env::var("STRIPE_PUBLISHABLE_KEY")
                .ok()
                .filter(|s| !s.is_empty()),
            payment_auto_accept: std::env::var("PAYMENT_AUTO_ACCEPT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
        })
    }

    /// Whether this is a production deployment
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
