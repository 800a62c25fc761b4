use std::{env, fmt};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AppEnvironment {
    Production,
    Development,
}

impl AppEnvironment {
    pub fn from(raw_environment: &str) -> Self {
        match raw_environment {
            "production" => Self::Production,
            _ => Self::Development,
        }
    }
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub host: String,
    pub environment: AppEnvironment,
    pub port: u32,
    pub url: String,
    pub menu_base_url: String,
}

#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub api_key: String,
    pub api_secret: String,
    pub upload_endpoint: String,
    pub upload_preset: String,
    pub folder: String,
}

#[derive(Clone, Debug)]
pub struct MailConfig {
    pub sender: String,
    pub uri: String,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database: DatabaseConfig,
    pub app: AppConfig,
    pub storage: StorageConfig,
    pub mail: Option<MailConfig>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Missing(key) => write!(f, "{} not set", key),
            Error::Invalid(key) => write!(f, "{} has an invalid value", key),
        }
    }
}

impl std::error::Error for Error {}

impl Config {
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| lookup(key).ok_or(Error::Missing(key));

        let database_url = required("DATABASE_URL")?;
        let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => raw
                .parse::<u32>()
                .map_err(|_| Error::Invalid("DATABASE_MAX_CONNECTIONS"))?,
            None => 5,
        };
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let environment = AppEnvironment::from(required("APP_ENV")?.as_str());
        let port = lookup("PORT")
            .unwrap_or_else(|| "8000".to_string())
            .parse::<u32>()
            .map_err(|_| Error::Invalid("PORT"))?;
        let url = lookup("URL").unwrap_or_else(|| format!("http://{}:{}", host, port));
        let menu_base_url = lookup("MENU_BASE_URL").unwrap_or_else(|| url.clone());

        let storage = StorageConfig {
            api_key: required("CLOUDINARY_API_KEY")?,
            api_secret: required("CLOUDINARY_API_SECRET")?,
            upload_endpoint: required("CLOUDINARY_UPLOAD_ENDPOINT")?,
            upload_preset: required("CLOUDINARY_UPLOAD_PRESET")?,
            folder: lookup("CLOUDINARY_FOLDER").unwrap_or_else(|| "digital-menu".to_string()),
        };

        let mail = match (lookup("MAIL_SENDER"), lookup("MAIL_URI")) {
            (Some(sender), Some(uri)) => Some(MailConfig { sender, uri }),
            (None, Some(_)) => return Err(Error::Missing("MAIL_SENDER")),
            (_, None) if environment == AppEnvironment::Production => {
                return Err(Error::Missing("MAIL_URI"))
            }
            (_, None) => None,
        };

        Ok(Config {
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            app: AppConfig {
                host,
                environment,
                port,
                url,
                menu_base_url,
            },
            storage,
            mail,
        })
    }
}
