//! fmquery - A fluent, driver-agnostic query builder for FileMaker
//!
//! Queries are described with a chainable vocabulary (`layout`, `where_`,
//! `where_in`, `where_not`, `take`, `order_by`, ...) and compiled at the
//! terminal call into either a native find command or a Data API request.
//!
//! # Example
//! ```ignore
//! use fmquery::{ConnectionConfig, FileMaker, FieldData, QueryBuilder};
//!
//! let mut fm = FileMaker::connect(
//!     ConnectionConfig::new("fmrest")
//!         .with_host("fm.example.com")
//!         .with_file("Sales")
//!         .with_credentials("api", "secret"),
//! )?;
//!
//! let orders = fm
//!     .layout("Orders")
//!     .where_("status", "open")
//!     .where_not("region", "north")
//!     .take(20)
//!     .get()
//!     .await?;
//!
//! let created = fm
//!     .layout("Orders")
//!     .insert(FieldData::new().set("name", "A").set("qty", 5))
//!     .await?;
//! ```

pub mod builders;
pub mod clauses;
pub mod config;
pub mod drivers;
pub mod error;
pub mod traits;
pub mod types;

mod client;

// Re-export main types for convenient access
pub use client::{Driver, FileMaker};
pub use config::{ConnectionConfig, DriverKind};
pub use error::{FmError, Result};
pub use traits::{HttpTransport, NativeConnector, QueryBuilder};
pub use types::{FieldData, FieldValue, FieldValues, InsertData, Record};
