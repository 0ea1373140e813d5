//! # Trade Journal Database Crate
//!
//! Persistence for portfolios and their trades.
//!
//! ## Architectural Principles
//!
//! - **Adapter:** All SQL lives here. The rest of the application talks to the
//!   `PortfolioStore` / `TradeStore` traits and never sees a query.
//! - **Owner scoping:** Every operation takes the caller's user id. Rows owned by
//!   someone else behave as if they did not exist.
//! - **Derived balance:** A portfolio's `balance` is never written directly. Each
//!   trade write recomputes it from `initial_balance` and the trade results.
//!
//! ## Public API
//!
//! - `connect` / `run_migrations`: PostgreSQL pool setup.
//! - `DbRepository`: the PostgreSQL store, using runtime-checked `sqlx` queries.
//! - `InMemoryRepository`: a lock-guarded store for tests and database-less runs.
//! - `Repository`: the combined trait, used as `Arc<dyn Repository>`.
//! - `DbError`: the specific error types that can be returned from this crate.

pub mod connection;
pub mod error;
pub mod lifecycle;
pub mod memory;
pub mod repository;
pub mod store;

pub use connection::{connect, run_migrations};
pub use error::DbError;
pub use memory::InMemoryRepository;
pub use repository::{DbPortfolio, DbRepository, DbTrade};
pub use store::{PortfolioStore, Repository, TradeStore};
