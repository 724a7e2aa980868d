use std::env;

/// Application configuration parsed from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// Flat income tax rate in basis points (2000 = 20%)
    pub tax_rate_bps: u32,
    /// Default cache lifetime for generated reports, in hours
    pub cache_ttl_hours: i64,
    /// Cache lifetime for large report payloads, in hours
    pub cache_ttl_large_hours: i64,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| "DATABASE_URL must be set".to_string())?;

        let host = env::var("HOST")
            .unwrap_or_else(|_| "0.0.0.0".to_string());

        let port: u16 = env::var("PORT")
            .unwrap_or_else(|_| "8094".to_string())
            .parse()
            .map_err(|_| "PORT must be a valid u16".to_string())?;

        let tax_rate_bps: u32 = env::var("TAX_RATE_BPS")
            .unwrap_or_else(|_| "2000".to_string())
            .parse()
            .map_err(|_| "TAX_RATE_BPS must be a valid u32".to_string())?;

        let cache_ttl_hours: i64 = env::var("REPORT_CACHE_TTL_HOURS")
            .unwrap_or_else(|_| "24".to_string())
            .parse()
            .map_err(|_| "REPORT_CACHE_TTL_HOURS must be a valid i64".to_string())?;

        let cache_ttl_large_hours: i64 = env::var("REPORT_CACHE_TTL_LARGE_HOURS")
            .unwrap_or_else(|_| "48".to_string())
            .parse()
            .map_err(|_| "REPORT_CACHE_TTL_LARGE_HOURS must be a valid i64".to_string())?;

        Ok(Config {
            database_url,
            host,
            port,
            tax_rate_bps,
            cache_ttl_hours,
            cache_ttl_large_hours,
        })
    }
}
