//! Server Configuration

/// Storefront server configuration.
///
/// # Environment variables
///
/// | Variable | Default | Purpose |
/// |----------|---------|---------|
/// | HTTP_PORT | 3000 | HTTP API port |
/// | DATABASE_PATH | thrift.db | SQLite database file |
/// | LOG_LEVEL | info | Log filter when RUST_LOG is unset |
/// | LOG_DIR | (none) | Daily-rolling log directory; stdout when unset |
/// | CORS_ORIGIN | * | Allowed origin for the storefront |
/// | STRIPE_SECRET_KEY | (none) | Payment gateway key; checkout disabled when unset |
/// | SHIPPO_API_TOKEN | (none) | Shipping label token; labels skipped when unset |
/// | SHIPPO_CARRIER_ACCOUNT | (none) | Shippo carrier account object id |
/// | SHIP_FROM_STREET | 201 College Ave | Shop ship-from street |
/// | SHIP_FROM_CITY | Blacksburg | Shop ship-from city |
/// | SHIP_FROM_STATE | VA | Shop ship-from state |
/// | SHIP_FROM_ZIP | 24060 | Shop ship-from zip |
/// | EBAY_OAUTH_TOKEN | (none) | Marketplace feed token; feed empty when unset |
/// | EBAY_SELLER_NAME | hokiesthrift | Marketplace seller filter |
#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub database_path: String,
    pub log_level: String,
    pub log_dir: Option<String>,
    pub cors_origin: String,

    pub stripe_secret_key: Option<String>,
    pub shippo_api_token: Option<String>,
    pub shippo_carrier_account: Option<String>,
    pub ship_from_street: String,
    pub ship_from_city: String,
    pub ship_from_state: String,
    pub ship_from_zip: String,
    pub ebay_oauth_token: Option<String>,
    pub ebay_seller_name: String,
}

impl Config {
    /// Load configuration from environment variables, with defaults for
    /// anything unset.
    pub fn from_env() -> Self {
        Self {
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            database_path: std::env::var("DATABASE_PATH").unwrap_or_else(|_| "thrift.db".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok(),
            cors_origin: std::env::var("CORS_ORIGIN").unwrap_or_else(|_| "*".into()),

            stripe_secret_key: std::env::var("STRIPE_SECRET_KEY").ok(),
            shippo_api_token: std::env::var("SHIPPO_API_TOKEN").ok(),
            shippo_carrier_account: std::env::var("SHIPPO_CARRIER_ACCOUNT").ok(),
            ship_from_street: std::env::var("SHIP_FROM_STREET")
                .unwrap_or_else(|_| "201 College Ave".into()),
            ship_from_city: std::env::var("SHIP_FROM_CITY")
                .unwrap_or_else(|_| "Blacksburg".into()),
            ship_from_state: std::env::var("SHIP_FROM_STATE").unwrap_or_else(|_| "VA".into()),
            ship_from_zip: std::env::var("SHIP_FROM_ZIP").unwrap_or_else(|_| "24060".into()),
            ebay_oauth_token: std::env::var("EBAY_OAUTH_TOKEN").ok(),
            ebay_seller_name: std::env::var("EBAY_SELLER_NAME")
                .unwrap_or_else(|_| "hokiesthrift".into()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
