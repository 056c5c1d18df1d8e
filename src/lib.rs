#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # INSS Batch Cleansing Core
//!
//! Async core for cleansing batches of INSS beneficiary records: each batch
//! wraps an uploaded list of (document number, benefit number) pairs, and a
//! per-batch loop validates every record, queries the external balance
//! service at a throttled cadence, and persists usable results — while the
//! shared bearer token may be refreshed mid-run by an independent timer.
//!
//! ## Architecture
//!
//! One sequential record loop per batch (the external service is rate
//! limited to one request per interval); loops for different batches run
//! concurrently and independently. Pause and delete invalidate the loop's
//! pending continuation at its single suspension point, so an in-flight
//! lookup always completes and its counters are applied before the loop
//! parks.
//!
//! ## Module Organization
//!
//! - [`engine`] - The batch processing engine: state machine, commands,
//!   per-batch record loops
//! - [`registry`] - Bounded collection of live batches
//! - [`token`] - Shared bearer-token cell and background refresh
//! - [`clients`] - External auth and balance-lookup clients
//! - [`sink`] - Result persistence (save / delete / select by label)
//! - [`upload`] - Delimited-text parsing and label derivation
//! - [`validation`] - Structural record checks
//! - [`export`] - CSV rendering of persisted rows
//! - [`models`] - Fixed-shape domain structs
//! - [`state_machine`] - Batch lifecycle states
//! - [`events`] - Progress broadcast for observers
//! - [`config`] - Configuration management
//! - [`error`] - Structured error handling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use inss_batch_core::clients::{AuthClient, Credentials, HttpLookupClient};
//! use inss_batch_core::config::InssBatchConfig;
//! use inss_batch_core::engine::BatchEngine;
//! use inss_batch_core::registry::BatchRegistry;
//! use inss_batch_core::sink::PostgresSink;
//! use inss_batch_core::token::TokenManager;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = InssBatchConfig::load(None)?;
//! let pool = sqlx::PgPool::connect(&config.database.url).await?;
//!
//! let tokens = Arc::new(TokenManager::new(AuthClient::new(&config.auth)));
//! let engine = BatchEngine::new(
//!     &config.engine,
//!     Arc::new(BatchRegistry::new(config.engine.max_batches)),
//!     Arc::new(HttpLookupClient::new(&config.lookup)?),
//!     Arc::new(PostgresSink::new(pool)),
//!     tokens.clone(),
//! );
//!
//! let credentials = Credentials::from_config(&config.auth);
//! engine.authenticate(&credentials).await?;
//! tokens.spawn_refresh_task(credentials, config.token.refresh_interval());
//!
//! let id = engine.add_batch()?;
//! engine.load(id, "lote_01.csv", "cpf;nb\n12345678901;1234567890")?;
//! engine.start(id)?;
//! # Ok(())
//! # }
//! ```

pub mod clients;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod export;
pub mod logging;
pub mod models;
pub mod registry;
pub mod sink;
pub mod state_machine;
pub mod token;
pub mod upload;
pub mod validation;

pub use config::InssBatchConfig;
pub use engine::BatchEngine;
pub use error::{BatchError, Result, ValidationError};
pub use events::{BatchEvent, BatchEventKind, EventPublisher};
pub use models::{Batch, BatchRecord, BatchSnapshot, BenefitBalances, CleansedRow, RecordOutcome};
pub use registry::BatchRegistry;
pub use state_machine::BatchState;
pub use token::TokenManager;
