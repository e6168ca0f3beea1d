//! Weather-driven work order dispatch.
//!
//! Each dispatch cycle compares current snowfall against service contract
//! thresholds and creates at most one job per contract per calendar day:
//!
//! - [`weather`]: the [`WeatherSource`] capability and its implementations.
//! - [`registry`]: the contract and job registries the dispatcher reads
//!   and writes, with in-memory and PostgreSQL implementations.
//! - [`evaluator`]: selects contracts whose threshold a reading meets.
//! - [`dedup`]: checks whether a contract already has a job today.
//! - [`materializer`]: builds and inserts the job record.
//! - [`cycle`]: the [`Dispatcher`] that runs one full pass and tallies it.
//! - [`scheduler`]: [`DispatchScheduler`], the periodic background runner.

pub mod config;
pub mod cycle;
pub mod dedup;
pub mod error;
pub mod evaluator;
pub mod materializer;
pub mod registry;
pub mod scheduler;
pub mod weather;

pub use config::DispatchConfig;
pub use cycle::{DispatchResult, Dispatcher};
pub use error::{DispatchError, FetchError, RegistryError};
pub use registry::{ContractRegistry, InsertOutcome, JobRegistry};
pub use scheduler::DispatchScheduler;
pub use weather::WeatherSource;
