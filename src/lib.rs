//! Viewer Schemas
//!
//! Declarative record schemas (User, Product, Lead, Inquiry) for a generic
//! database viewer. The viewer reads the definitions through `GET /schema`,
//! validates documents against them and owns all storage and CRUD.
//!
//! ## Features
//!
//! - **Static Registry**: Record types are checked at startup, read-only afterwards
//! - **Exhaustive Validation**: Every violated constraint is reported, defaults applied on success
//! - **Fingerprinting**: SHA256 over the definitions, served as an ETag
//! - **JSON Schema Export**: Each record type as a draft-07 document
//! - **Extensible**: Extra record types load from JSON definition files
//!
//! ## Example
//!
//! ```
//! use viewer_schemas::SchemaRegistry;
//! use serde_json::json;
//!
//! let registry = SchemaRegistry::builtin()?;
//! let record = registry.validate("lead", &json!({
//!     "name": "Jo",
//!     "email": "jo@example.com",
//!     "message": "Need a new website",
//! }))?;
//! assert!(record.get("business_name").unwrap().is_null());
//! # Ok::<(), viewer_schemas::SchemaError>(())
//! ```

pub mod catalog;
pub mod checksum;
pub mod config;
pub mod error;
pub mod json_schema;
pub mod registry;
pub mod schema;
pub mod server;
pub mod validate;

pub use checksum::Checksum;
pub use config::SchemaConfig;
pub use error::{Result, SchemaError};
pub use registry::{RegistryBuilder, SchemaDocument, SchemaRegistry};
pub use schema::{Constraints, FieldDef, FieldType, RecordType};
pub use validate::{Rule, ValidatedRecord, ValidationErrors, Violation};
