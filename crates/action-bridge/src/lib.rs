//! Action Bridge Library
//!
//! A local HTTP control surface for an IDE's command system, handling:
//!
//! - **Execution**: Single commands, chains with smart or fixed delays
//! - **Conditionals**: If/then/else on UI state predicates and OR-chains
//! - **State Queries**: Live editor, file, focus and tool-window predicates
//! - **History**: Execution log, per-command statistics and usage suggestions
//!
//! ## Architecture
//!
//! The IDE is reached through two traits in [`host`]: a command registry
//! and a UI context. Every call into them runs on one UI dispatch thread
//! owned by [`engine::UiDispatcher`]; HTTP handlers block on it from tokio's
//! blocking pool. History is held in memory and snapshotted to JSON files.
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading from environment variables
//! - [`engine`]: Classification, execution, conditionals and state predicates
//! - [`error`]: Custom error types with Axum integration
//! - [`handlers`]: HTTP route handlers
//! - [`history`]: Execution history, statistics and persistence
//! - [`host`]: Host collaborator traits and the in-memory host
//! - [`router`]: Route table and middleware stack
//! - [`state`]: Shared application state
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use action_bridge::{
//!     config::AppConfig, history::HistoryStore, host::InMemoryHost,
//!     router::build_router, state::AppState,
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let host = Arc::new(InMemoryHost::new().with_commands(["SaveAll"]));
//!     let state = AppState::for_host(AppConfig::default(), host, Arc::new(HistoryStore::in_memory()))?;
//!     let app = build_router(state);
//!     // ... bind and serve
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod history;
pub mod host;
pub mod middleware;
pub mod result_ext;
pub mod router;
pub mod state;

pub use error::{AppError, AppResult};
pub use result_ext::ResultExt;
