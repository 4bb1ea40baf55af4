use std::{env, fs, ops::Deref, sync::Arc};

use crate::{dao::get_path, error::Error, provider::DatabasePool};

#[derive(Debug)]
pub struct AppState<T>(Arc<T>);

impl<T> AppState<T> {
    pub fn new(state: T) -> AppState<T> {
        AppState(Arc::new(state))
    }
}

impl<T> Clone for AppState<T> {
    fn clone(&self) -> AppState<T> {
        AppState(Arc::clone(&self.0))
    }
}

impl<T> Deref for AppState<T> {
    type Target = Arc<T>;

    fn deref(&self) -> &Arc<T> {
        &self.0
    }
}

#[derive(Debug)]
pub struct State {
    pub config: Config,
    pub database: DatabasePool,
}

impl State {
    pub async fn new(
        config: Config,
        database: DatabasePool,
    ) -> Result<State, Error> {
        Self::init_migrations(&database).await?;
        Ok(Self { config, database })
    }

    async fn init_migrations(database: &DatabasePool) -> Result<(), Error> {
        let files = vec!["subscription.sql"];

        let dir = env!("CARGO_MANIFEST_DIR");

        for file in files {
            let data = get_path(dir, file)?;
            for statement in data.split(';') {
                let statement = statement.trim();
                if statement.is_empty() {
                    continue;
                }
                sqlx::query(statement).execute(&database.pool).await?;
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub server_host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub static_dir: String,
    pub timeout: u64,
    pub max_tasks: usize,
    pub push_enabled: bool,
    pub push_ttl: i64,
    pub mail_to: String,
    pub vapid_private_key: Vec<u8>,
    pub vapid_public_key: Vec<u8>,
    pub auth: String,
}

// Key material is optional at startup: a deployment without push credentials
// still serves subscriptions, and dispatch fails at client construction.
fn parse_config_vapid_keys() -> (Vec<u8>, Vec<u8>) {
    let directory = env!("CARGO_MANIFEST_DIR");
    let private_key_dir = format!("{}/cert/vapid_private.pem", directory);
    let public_key_dir = format!("{}/cert/vapid_public.b64", directory);

    let private_key = env::var("PUSH_PRIVATE_KEY")
        .map(String::into_bytes)
        .or_else(|_| fs::read(private_key_dir))
        .unwrap_or_default();
    let public_key = env::var("PUSH_PUBLIC_KEY")
        .map(String::into_bytes)
        .or_else(|_| fs::read(public_key_dir))
        .unwrap_or_default();

    (private_key, public_key)
}

pub fn get_configuration() -> Result<Config, Error> {
    let database_url = env::var("DATABASE_URL")?;
    let server_host = env::var("SERVER_HOST")?;
    let port: u16 = env::var("PORT")?.parse()?;
    let allowed_origins = env::var("ALLOWED_ORIGINS")?
        .split(',')
        .map(|item| item.to_owned())
        .collect::<Vec<String>>();
    let static_dir = format!(
        "{}/{}",
        env!("CARGO_MANIFEST_DIR"),
        env::var("STATIC_DIRECTORY")?
    );
    let timeout = env::var("TIMEOUT")?.parse()?;
    let max_tasks = env::var("MAX_TASKS")?.parse()?;
    let push_enabled = env::var("PUSH_ENABLED")?.parse()?;
    let push_ttl = env::var("PUSH_TTL")?.parse()?;
    let mail_to: String = env::var("MAIL_TO")?;
    let auth = env::var("AUTH")?.parse()?;

    let (vapid_private_key, vapid_public_key) = parse_config_vapid_keys();

    let config = Config {
        database_url,
        server_host,
        port,
        allowed_origins,
        static_dir,
        timeout,
        max_tasks,
        push_enabled,
        push_ttl,
        mail_to,
        vapid_private_key,
        vapid_public_key,
        auth,
    };

    Ok(config)
}

pub fn set_configuration() -> Result<(), Error> {
    let config_file: &str = ".env";

    let directory = env!("CARGO_MANIFEST_DIR");
    let path = format!("{}/{}", directory, config_file);

    if let Ok(config_string) = fs::read_to_string(path) {
        parse_config_string(config_string)?;
    }

    Ok(())
}

fn parse_config_string(config: String) -> Result<(), Error> {
    let params: Vec<Option<(&str, &str)>> = config
        .split('\n')
        .map(|s| {
            let element = s.find('=');
            if let Some(e) = element {
                return Some(s.split_at(e));
            }
            None
        })
        .map(|value| {
            if let Some((k, v)) = value {
                return Some((k, &v[1..]));
            }
            None
        })
        .collect();

    for (key, value) in params.into_iter().flatten() {
        std::env::set_var(key, value);
    }

    Ok(())
}
