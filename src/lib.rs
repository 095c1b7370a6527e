pub mod config;
pub mod error;
pub mod exclusion;
pub mod filter;
pub mod streaming;

pub use config::{FilterConfig, LineTerminator};
pub use error::FilterError;
pub use exclusion::ExclusionSet;
pub use filter::{dry_run, filter_batch, run, FilterSummary};
