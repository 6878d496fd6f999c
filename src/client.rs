use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use crate::clauses::QueryState;
use crate::config::{ConnectionConfig, DriverKind};
use crate::drivers::{NativeDriver, ReqwestTransport, RestDriver};
use crate::error::{FmError, Result};
use crate::traits::{HttpTransport, NativeConnector, QueryBuilder};
use crate::types::{FieldData, InsertData, Record};

/// The configured backend.
pub enum Driver {
    Native(NativeDriver),
    Rest(RestDriver),
}

impl Driver {
    pub fn kind(&self) -> DriverKind {
        match self {
            Driver::Native(_) => DriverKind::Native,
            Driver::Rest(_) => DriverKind::Rest,
        }
    }
}

#[async_trait]
impl QueryBuilder for Driver {
    fn layout_name(&self) -> Option<&str> {
        match self {
            Driver::Native(d) => d.layout_name(),
            Driver::Rest(d) => d.layout_name(),
        }
    }

    fn set_layout(&mut self, layout: String) {
        match self {
            Driver::Native(d) => d.set_layout(layout),
            Driver::Rest(d) => d.set_layout(layout),
        }
    }

    fn state(&self) -> &QueryState {
        match self {
            Driver::Native(d) => d.state(),
            Driver::Rest(d) => d.state(),
        }
    }

    fn state_mut(&mut self) -> &mut QueryState {
        match self {
            Driver::Native(d) => d.state_mut(),
            Driver::Rest(d) => d.state_mut(),
        }
    }

    async fn fetch(&mut self, only: Option<&str>) -> Result<Vec<Record>> {
        match self {
            Driver::Native(d) => d.fetch(only).await,
            Driver::Rest(d) => d.fetch(only).await,
        }
    }

    async fn insert<D>(&mut self, data: D) -> Result<Vec<Record>>
    where
        D: Into<InsertData> + Send,
    {
        match self {
            Driver::Native(d) => d.insert(data).await,
            Driver::Rest(d) => d.insert(data).await,
        }
    }

    async fn update(&mut self, data: &FieldData) -> Result<Vec<Record>> {
        match self {
            Driver::Native(d) => d.update(data).await,
            Driver::Rest(d) => d.update(data).await,
        }
    }

    async fn delete(&mut self) -> Result<bool> {
        match self {
            Driver::Native(d) => d.delete().await,
            Driver::Rest(d) => d.delete().await,
        }
    }

    async fn by_record_id(&mut self, record_id: &str) -> Result<Option<Record>> {
        match self {
            Driver::Native(d) => d.by_record_id(record_id).await,
            Driver::Rest(d) => d.by_record_id(record_id).await,
        }
    }
}

/// Main entry point for fmquery.
/// Holds the connection configuration and the driver it selected; every
/// fluent call is forwarded to that driver.
///
/// # Example
/// ```ignore
/// let mut fm = FileMaker::connect(
///     ConnectionConfig::new("fmrest")
///         .with_host("fm.example.com")
///         .with_file("Sales")
///         .with_credentials("api", "secret"),
/// )?;
///
/// let open = fm.layout("Orders").where_("status", "open").count().await?;
/// ```
pub struct FileMaker {
    config: ConnectionConfig,
    driver: Driver,
    connector: Option<Arc<dyn NativeConnector>>,
    transport: Option<Arc<dyn HttpTransport>>,
}

impl FileMaker {
    /// Boots the driver named in `config`. The Data API driver talks HTTPS
    /// through reqwest; the native driver needs a connector, see
    /// [`FileMaker::with_connector`].
    pub fn connect(config: ConnectionConfig) -> Result<Self> {
        Self::boot(config, None, None)
    }

    /// Create a client whose native driver uses the given connector.
    pub fn with_connector(config: ConnectionConfig, connector: Arc<dyn NativeConnector>) -> Result<Self> {
        Self::boot(config, Some(connector), None)
    }

    /// Create a client whose Data API driver uses a custom transport.
    /// Useful for testing or routing through another HTTP stack.
    pub fn with_transport(config: ConnectionConfig, transport: Arc<dyn HttpTransport>) -> Result<Self> {
        Self::boot(config, None, Some(transport))
    }

    fn boot(
        config: ConnectionConfig,
        connector: Option<Arc<dyn NativeConnector>>,
        transport: Option<Arc<dyn HttpTransport>>,
    ) -> Result<Self> {
        let driver = Self::boot_driver(&config, connector.as_ref(), transport.as_ref())?;
        Ok(Self {
            config,
            driver,
            connector,
            transport,
        })
    }

    fn boot_driver(
        config: &ConnectionConfig,
        connector: Option<&Arc<dyn NativeConnector>>,
        transport: Option<&Arc<dyn HttpTransport>>,
    ) -> Result<Driver> {
        let kind = config.driver_kind()?;
        info!(driver = %kind, host = %config.host, file = %config.file, "booting driver");

        match kind {
            DriverKind::Native => {
                let connector = connector.cloned().ok_or_else(|| {
                    FmError::configuration("The native driver requires a connector")
                })?;
                let mut driver = NativeDriver::new(connector);
                driver.set_connection(config.clone());
                Ok(Driver::Native(driver))
            }
            DriverKind::Rest => {
                let transport: Arc<dyn HttpTransport> = match transport {
                    Some(transport) => Arc::clone(transport),
                    None => Arc::new(ReqwestTransport::new(config)?),
                };
                let mut driver = RestDriver::new(transport);
                driver.set_connection(config.clone());
                Ok(Driver::Rest(driver))
            }
        }
    }

    /// Merges `overrides` into the stored configuration and boots a fresh
    /// driver from the result. Query state and any session are discarded.
    pub fn connection(&mut self, overrides: Value) -> Result<&mut Self> {
        let config = self.config.merge(overrides)?;
        self.driver = Self::boot_driver(&config, self.connector.as_ref(), self.transport.as_ref())?;
        self.config = config;
        Ok(self)
    }

    /// Restores the stored configuration to defaults. The current driver
    /// keeps running until `connection` boots a new one.
    pub fn reset_connection(&mut self) -> &mut Self {
        self.config = ConnectionConfig::default();
        self
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn driver_kind(&self) -> DriverKind {
        self.driver.kind()
    }

    pub fn driver(&self) -> &Driver {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut Driver {
        &mut self.driver
    }
}

impl Deref for FileMaker {
    type Target = Driver;

    fn deref(&self) -> &Driver {
        &self.driver
    }
}

impl DerefMut for FileMaker {
    fn deref_mut(&mut self) -> &mut Driver {
        &mut self.driver
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::{InMemoryConnector, InMemoryTransport};
    use serde_json::json;

    #[test]
    fn test_connect_requires_driver() {
        let err = FileMaker::connect(ConnectionConfig::default()).err().unwrap();
        assert_eq!(err.to_string(), "Configuration error: No connection driver set");

        let err = FileMaker::connect(ConnectionConfig::new("odbc")).err().unwrap();
        assert_eq!(err.to_string(), "Configuration error: Unknown connection driver");
    }

    #[test]
    fn test_native_requires_connector() {
        let err = FileMaker::connect(ConnectionConfig::new("fmphp")).err().unwrap();
        assert!(err.is_configuration());

        let fm = FileMaker::with_connector(
            ConnectionConfig::new("fmphp"),
            Arc::new(InMemoryConnector::new()),
        )
        .unwrap();
        assert_eq!(fm.driver_kind(), DriverKind::Native);
    }

    #[test]
    fn test_connection_merges_and_reboots() {
        let mut fm = FileMaker::with_transport(
            ConnectionConfig::new("fmrest").with_host("fm.example.com"),
            Arc::new(InMemoryTransport::new()),
        )
        .unwrap();
        fm.layout("Orders").where_("status", "open");
        assert_eq!(fm.state().criteria.len(), 1);

        fm.connection(json!({"file": "Sales"})).unwrap();

        assert_eq!(fm.config().host, "fm.example.com");
        assert_eq!(fm.config().file, "Sales");
        assert!(fm.state().criteria.is_empty());
        assert!(fm.layout_name().is_none());
    }

    #[test]
    fn test_reset_connection_clears_config() {
        let mut fm = FileMaker::with_transport(
            ConnectionConfig::new("fmrest").with_host("fm.example.com"),
            Arc::new(InMemoryTransport::new()),
        )
        .unwrap();
        fm.reset_connection();
        assert_eq!(fm.config(), &ConnectionConfig::default());
        assert_eq!(fm.driver_kind(), DriverKind::Rest);

        let err = fm.connection(json!({})).err().unwrap();
        assert!(err.is_configuration());
    }
}
