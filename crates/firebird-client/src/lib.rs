//! Firebird connections for company databases.
//!
//! Connects over the Firebird wire protocol with credentials taken from the
//! process configuration. Connections are opened per lookup and closed when
//! dropped; nothing is pooled here.

use pricing_core::{ConnectionConfig, ConnectionProvider, DataAccessError, DataConnection, Row};
use rsfbclient::prelude::*;
use rsfbclient::SimpleConnection;
use std::fmt;
use std::path::Path;

/// Database path in the form the server expects: forward slashes and an
/// explicit leading slash, so `C:\Aspel\DATOS.FDB` becomes `/C:/Aspel/DATOS.FDB`.
pub fn normalize_path_text(path: &str) -> String {
    let normalized = path.replace('\\', "/");
    if normalized.starts_with('/') {
        normalized
    } else {
        format!("/{}", normalized)
    }
}

/// Absolute, normalized form of a database file path
pub fn normalize_database_path(path: &Path) -> String {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    normalize_path_text(&absolute.to_string_lossy())
}

/// Where a connection points
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionTarget {
    pub host: String,
    pub port: u16,
    pub database: String,
}

impl ConnectionTarget {
    pub fn new(config: &ConnectionConfig, database: &Path) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            database: normalize_database_path(database),
        }
    }
}

impl fmt::Display for ConnectionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}:{}", self.host, self.port, self.database)
    }
}

/// Opens one Firebird connection per call
#[derive(Debug, Clone)]
pub struct FirebirdConnectionProvider {
    config: ConnectionConfig,
}

impl FirebirdConnectionProvider {
    pub fn new(config: &ConnectionConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }
}

impl ConnectionProvider for FirebirdConnectionProvider {
    type Connection = FirebirdConnection;

    fn open(&self, database: &Path) -> Result<Self::Connection, DataAccessError> {
        let target = ConnectionTarget::new(&self.config, database);
        tracing::debug!("Opening Firebird connection to {}", target);

        let connection = rsfbclient::builder_pure_rust()
            .host(target.host.as_str())
            .port(target.port)
            .db_name(target.database.as_str())
            .user(self.config.username.as_str())
            .pass(self.config.password.as_str())
            .charset(rsfbclient::charset::UTF_8)
            .connect()
            .map_err(|e| DataAccessError::Connection(format!("{}: {}", target, e)))?;

        Ok(FirebirdConnection {
            inner: connection.into(),
            target,
        })
    }
}

/// Live connection; closed on drop
pub struct FirebirdConnection {
    inner: SimpleConnection,
    target: ConnectionTarget,
}

impl FirebirdConnection {
    pub fn target(&self) -> &ConnectionTarget {
        &self.target
    }
}

impl DataConnection for FirebirdConnection {
    fn query(&mut self, sql: &str, key: &str) -> Result<Vec<Row>, DataAccessError> {
        let rows: Vec<rsfbclient::Row> = self
            .inner
            .query(sql, (key.to_string(),))
            .map_err(|e| DataAccessError::Query(e.to_string()))?;

        rows.into_iter().map(text_row).collect()
    }
}

impl Drop for FirebirdConnection {
    fn drop(&mut self) {
        tracing::debug!("Closing Firebird connection to {}", self.target);
    }
}

fn text_row(row: rsfbclient::Row) -> Result<Row, DataAccessError> {
    (0..row.cols.len())
        .map(|column| {
            row.get::<Option<String>>(column)
                .map_err(|e| DataAccessError::Decode {
                    column,
                    message: e.to_string(),
                })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Row::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_windows_paths_get_forward_slashes_and_leading_slash() {
        assert_eq!(
            normalize_path_text(r"C:\Program Files (x86)\Aspel\SAE90\Empresa01\Datos\SAE90EMPRE01.FDB"),
            "/C:/Program Files (x86)/Aspel/SAE90/Empresa01/Datos/SAE90EMPRE01.FDB"
        );
    }

    #[test]
    fn test_unix_paths_are_unchanged() {
        assert_eq!(
            normalize_path_text("/srv/aspel/DATOS.FDB"),
            "/srv/aspel/DATOS.FDB"
        );
    }

    #[test]
    fn test_relative_paths_become_absolute() {
        let normalized = normalize_database_path(Path::new("datos/SAE.FDB"));
        assert!(normalized.starts_with('/'));
        assert!(normalized.ends_with("datos/SAE.FDB"));
        assert!(!normalized.contains('\\'));
    }

    #[test]
    fn test_target_uses_configured_host_and_port() {
        let config = ConnectionConfig {
            host: "erp-server".to_string(),
            port: 3051,
            ..ConnectionConfig::default()
        };
        let target = ConnectionTarget::new(&config, Path::new("/data/EMPRE01.FDB"));
        assert_eq!(target.to_string(), "erp-server/3051:/data/EMPRE01.FDB");
    }

    #[test]
    fn test_provider_keeps_its_own_copy_of_credentials() {
        let config = ConnectionConfig::default();
        let provider = FirebirdConnectionProvider::new(&config);
        let printed = format!("{:?}", provider);
        assert!(printed.contains("localhost"));
        assert!(!printed.contains("masterkey"));
    }
}
