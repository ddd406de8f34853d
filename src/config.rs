use crate::leave::duration::WorkWindow;
use chrono::{FixedOffset, NaiveTime};
use dotenvy::dotenv;
use std::env;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub access_token_ttl: usize,
    pub refresh_token_ttl: usize,

    /// Regional UTC offset in hours; all wall-clock rules (work window,
    /// lunch break, punch restrictions) are evaluated at this offset.
    pub tz_offset_hours: i32,
    pub work_day_start: NaiveTime,
    pub work_day_end: NaiveTime,

    /// Registration emails must belong to this domain.
    pub email_domain: String,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_register_per_min: u32,
    pub rate_refresh_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        Self {
            server_addr: env::var("SERVER_ADDR").expect("SERVER_ADDR must be set"),
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
            access_token_ttl: env::var("ACCESS_TOKEN_TTL")
                .unwrap_or_else(|_| "900".to_string()) // default 15 min
                .parse()
                .unwrap(),
            refresh_token_ttl: env::var("REFRESH_TOKEN_TTL")
                .unwrap_or_else(|_| "604800".to_string()) // default 7 days
                .parse()
                .unwrap(),

            tz_offset_hours: env::var("TZ_OFFSET_HOURS")
                .unwrap_or_else(|_| "8".to_string()) // Asia/Taipei
                .parse()
                .unwrap(),
            work_day_start: parse_time(
                &env::var("WORK_DAY_START").unwrap_or_else(|_| "08:00".to_string()),
            ),
            work_day_end: parse_time(
                &env::var("WORK_DAY_END").unwrap_or_else(|_| "18:00".to_string()),
            ),

            email_domain: env::var("EMAIL_DOMAIN")
                .unwrap_or_else(|_| "starkorrnell.org".to_string()),

            rate_login_per_min: env::var("RATE_LOGIN_PER_MIN")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .unwrap(),
            rate_register_per_min: env::var("RATE_REGISTER_PER_MIN")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap(),
            rate_refresh_per_min: env::var("RATE_REFRESH_PER_MIN")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap(),
            rate_protected_per_min: env::var("RATE_PROTECTED_PER_MIN")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()
                .unwrap(),

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),
        }
    }

    pub fn tz(&self) -> FixedOffset {
        FixedOffset::east_opt(self.tz_offset_hours * 3600).expect("TZ_OFFSET_HOURS out of range")
    }

    /// Company-wide fallback window for users without one configured.
    pub fn default_work_window(&self) -> WorkWindow {
        WorkWindow::new(self.work_day_start, self.work_day_end)
    }
}

fn parse_time(s: &str) -> NaiveTime {
    NaiveTime::parse_from_str(s, "%H:%M").expect("work window times must be HH:MM")
}
