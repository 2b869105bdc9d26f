// III-IV
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! REST service to manage job openings.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

use jobs_core::clocks::SystemClock;
use jobs_core::db::sqlite::{self, SqliteDb};
use jobs_core::db::{Db, DbError};
use jobs_core::env::get_optional_var;
use jobs_core::logger::Logger;
use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::net::TcpListener;

mod db;
mod driver;
use driver::Driver;
mod model;
mod rest;
use rest::app;

/// Default port to listen on.
const DEFAULT_PORT: u16 = 8080;

/// Default location of the database file.
const DEFAULT_DB_PATH: &str = "db/main.db";

/// Default maximum level of the records emitted through the `log` facade.
const DEFAULT_LOG_LEVEL: log::LevelFilter = log::LevelFilter::Warn;

/// Errors that prevent the service from starting.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    /// Indicates an invalid configuration.
    #[error("{0}")]
    Config(String),

    /// Indicates a failure to prepare the database.
    #[error("{0}")]
    Database(#[from] DbError),

    /// Indicates a failure to set up the network listener or to serve requests.
    #[error("{0}")]
    Io(#[from] io::Error),
}

/// Configuration of the service.
#[derive(Debug, PartialEq)]
pub struct Config {
    /// Port to listen on, on all interfaces.
    pub port: u16,

    /// Path to the SQLite database file.
    pub db_path: PathBuf,

    /// Maximum level of the records emitted by libraries through the `log` facade.
    pub log_level: log::LevelFilter,
}

impl Config {
    /// Creates a new configuration from environment variables named `<prefix>_<name>`, using
    /// defaults for the variables that are not set.
    pub fn from_env(prefix: &str) -> Result<Self, BootstrapError> {
        Ok(Self {
            port: get_optional_var(prefix, "PORT")
                .map_err(BootstrapError::Config)?
                .unwrap_or(DEFAULT_PORT),
            db_path: get_optional_var(prefix, "DB_PATH")
                .map_err(BootstrapError::Config)?
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH)),
            log_level: get_optional_var(prefix, "LOG_LEVEL")
                .map_err(BootstrapError::Config)?
                .unwrap_or(DEFAULT_LOG_LEVEL),
        })
    }
}

/// Opens the database at `path`, creating it if necessary, and ensures it has the schema of the
/// service.
async fn bootstrap(path: &Path, logger: &Logger) -> Result<SqliteDb, BootstrapError> {
    let db = sqlite::connect_file(path).await?;
    if let Err(e) = db::init_schema(&mut db.ex().await?).await {
        db.close().await;
        return Err(e.into());
    }
    logger.infof(format_args!("database ready at {}", path.display()));
    Ok(db)
}

/// Waits until the process is asked to terminate.
async fn shutdown_signal(logger: Logger) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        logger.errorf(format_args!("cannot listen for the shutdown signal: {}", e));
        return;
    }
    logger.info(&[&"shutting down"]);
}

/// Instantiates all resources to serve the application as described by `config`, reporting
/// progress to `logger`.
///
/// While it'd be nice to push this responsibility to `main`, doing so would force us to expose many
/// crate-internal types to the public, which in turn would make dead code detection harder.
pub async fn serve(config: Config, logger: Logger) -> Result<(), BootstrapError> {
    let db = Arc::from(bootstrap(&config.db_path, &logger).await?);
    let driver = Driver::new(db.clone(), Arc::new(SystemClock::default()), logger.clone());
    let app = app(driver);

    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, config.port));
    let result = match TcpListener::bind(addr).await {
        Ok(listener) => {
            logger.infof(format_args!("listening on {}", addr));
            axum::serve(listener, app).with_graceful_shutdown(shutdown_signal(logger)).await
        }
        Err(e) => Err(e),
    };

    db.close().await;
    Ok(result?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobs_core::logger::testutils::setup;
    use std::env;

    #[test]
    fn test_config_defaults() {
        temp_env::with_vars(
            [("TEST_PORT", None::<&str>), ("TEST_DB_PATH", None), ("TEST_LOG_LEVEL", None)],
            || {
                assert_eq!(
                    Config {
                        port: 8080,
                        db_path: PathBuf::from("db/main.db"),
                        log_level: log::LevelFilter::Warn,
                    },
                    Config::from_env("TEST").unwrap()
                );
            },
        );
    }

    #[test]
    fn test_config_all_present() {
        temp_env::with_vars(
            [
                ("TEST_PORT", Some("1234")),
                ("TEST_DB_PATH", Some("/tmp/openings.db")),
                ("TEST_LOG_LEVEL", Some("debug")),
            ],
            || {
                assert_eq!(
                    Config {
                        port: 1234,
                        db_path: PathBuf::from("/tmp/openings.db"),
                        log_level: log::LevelFilter::Debug,
                    },
                    Config::from_env("TEST").unwrap()
                );
            },
        );
    }

    #[test]
    fn test_config_invalid_port() {
        temp_env::with_vars([("TEST_PORT", Some("http"))], || {
            match Config::from_env("TEST") {
                Err(BootstrapError::Config(e)) => {
                    assert!(e.contains("Invalid type in environment variable TEST_PORT"))
                }
                r => panic!("Unexpected result: {:?}", r),
            }
        });
    }

    #[tokio::test]
    async fn test_bootstrap_creates_database() {
        let dir = env::temp_dir().join(format!("jobs-openings-bootstrap-{}", std::process::id()));
        let path = dir.join("db").join("main.db");
        let _ = std::fs::remove_dir_all(&dir);

        let (logger, sink) = setup();
        let db = bootstrap(&path, &logger).await.unwrap();
        assert!(db::get_openings(&mut db.ex().await.unwrap()).await.unwrap().is_empty());
        db.close().await;

        let db = bootstrap(&path, &logger).await.unwrap();
        db.close().await;

        assert_eq!(
            vec![format!("INFO: 2023/10/17 08:15:00 database ready at {}", path.display()); 2],
            sink.lines()
        );
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_serve_fails_when_database_cannot_be_created() {
        let dir = env::temp_dir().join(format!("jobs-openings-serve-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let blocker = dir.join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();

        let (logger, sink) = setup();
        let config =
            Config { port: 0, db_path: blocker.join("main.db"), log_level: log::LevelFilter::Warn };
        match serve(config, logger).await {
            Err(BootstrapError::Database(_)) => (),
            r => panic!("Unexpected result: {:?}", r),
        }

        assert!(sink.lines().is_empty(), "Unexpected log lines: {:?}", sink.lines());
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
