use clap::{Parser, ValueEnum};
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::path::PathBuf;
use stubby_store::settings::{DEFAULT_MAX_GENERATE_ATTEMPTS, DEFAULT_VALIDITY_MINUTES};
use stubby_store::StoreSettings;

pub const LISTEN_ADDR_ENV: &str = "STUBBY_LISTEN_ADDR";
pub const BASE_URL_ENV: &str = "STUBBY_BASE_URL";
pub const DEFAULT_VALIDITY_ENV: &str = "STUBBY_DEFAULT_VALIDITY_MINUTES";
pub const MAX_GENERATE_ATTEMPTS_ENV: &str = "STUBBY_MAX_GENERATE_ATTEMPTS";
pub const CODE_LENGTH_ENV: &str = "STUBBY_CODE_LENGTH";
pub const ACCESS_LOG_PATH_ENV: &str = "STUBBY_ACCESS_LOG_PATH";
pub const ACCESS_LOG_CAPACITY_ENV: &str = "STUBBY_ACCESS_LOG_CAPACITY";
pub const CORS_ORIGIN_ENV: &str = "STUBBY_CORS_ORIGIN";
pub const LOG_FORMAT_ENV: &str = "STUBBY_LOG_FORMAT";

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:5000";
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_CODE_LENGTH: usize = stubby_generator::random::DEFAULT_LENGTH;
pub const DEFAULT_ACCESS_LOG_PATH: &str = "logs.txt";
pub const DEFAULT_ACCESS_LOG_CAPACITY: usize = 1024;
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[value(name = "text")]
    Text,
    #[value(name = "json")]
    Json,
}

impl Display for LogFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "stubby-gateway")]
pub struct Cli {
    #[arg(long, env = LISTEN_ADDR_ENV, default_value = DEFAULT_LISTEN_ADDR)]
    pub listen_addr: SocketAddr,

    /// Public prefix of the short links handed back to clients.
    #[arg(long, env = BASE_URL_ENV, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    #[arg(long, env = DEFAULT_VALIDITY_ENV, default_value_t = DEFAULT_VALIDITY_MINUTES)]
    pub default_validity_minutes: NonZeroU32,

    #[arg(
        long,
        env = MAX_GENERATE_ATTEMPTS_ENV,
        default_value_t = DEFAULT_MAX_GENERATE_ATTEMPTS
    )]
    pub max_generate_attempts: u32,

    /// Length of generated short codes (4-10).
    #[arg(long, env = CODE_LENGTH_ENV, default_value_t = DEFAULT_CODE_LENGTH)]
    pub code_length: usize,

    #[arg(long, env = ACCESS_LOG_PATH_ENV, default_value = DEFAULT_ACCESS_LOG_PATH)]
    pub access_log_path: PathBuf,

    #[arg(
        long,
        env = ACCESS_LOG_CAPACITY_ENV,
        default_value_t = DEFAULT_ACCESS_LOG_CAPACITY
    )]
    pub access_log_capacity: usize,

    #[arg(long, env = CORS_ORIGIN_ENV, default_value = DEFAULT_CORS_ORIGIN)]
    pub cors_origin: String,

    #[arg(
        long,
        env = LOG_FORMAT_ENV,
        value_enum,
        default_value_t = LogFormat::Text
    )]
    pub log_format: LogFormat,
}

impl Cli {
    pub fn store_settings(&self) -> StoreSettings {
        StoreSettings::builder()
            .default_validity_minutes(self.default_validity_minutes)
            .max_generate_attempts(self.max_generate_attempts)
            .build()
    }
}
