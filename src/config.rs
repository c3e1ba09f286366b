use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub port: u16,

    // Admission control
    pub requests_per_second: u32,
    pub ddos_max_requests: u32,
    pub ddos_window_secs: u64,
}

impl Config {
    pub fn init() -> Config {
        let database_url = std::env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set");
        // No baked-in fallback: a missing secret is a startup error, not a
        // silently-shared default.
        let jwt_secret = std::env::var("JWT_SECRET")
            .expect("JWT_SECRET must be set");

        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "8080".to_owned())
            .parse::<u16>()
            .expect("PORT must be a number");

        let requests_per_second = std::env::var("RATE_LIMIT_RPS")
            .unwrap_or_else(|_| "20".to_owned())
            .parse::<u32>()
            .expect("RATE_LIMIT_RPS must be a number");
        let ddos_max_requests = std::env::var("DDOS_MAX_REQUESTS")
            .unwrap_or_else(|_| "500".to_owned())
            .parse::<u32>()
            .expect("DDOS_MAX_REQUESTS must be a number");
        let ddos_window_secs = std::env::var("DDOS_WINDOW_SECS")
            .unwrap_or_else(|_| "10".to_owned())
            .parse::<u64>()
            .expect("DDOS_WINDOW_SECS must be a number");

        Config {
            database_url,
            jwt_secret,
            port,
            requests_per_second,
            ddos_max_requests,
            ddos_window_secs,
        }
    }
}
