//! # UK HPI workspace
//!
//! Facade over the workspace crates: `hpi_forecast` runs the lagged
//! sales-volume analysis and `hpi_math` provides the least-squares fit and
//! summary statistics it is built on.
//!
//! ## Example
//!
//! ```
//! use uk_hpi_workspace::math::Summary;
//!
//! let summary = Summary::from_values(&[3.0, 1.0, 2.0]).unwrap();
//! assert_eq!(summary.median, 2.0);
//! ```

pub use hpi_forecast as forecast;
pub use hpi_math as math;
