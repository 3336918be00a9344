//! Reporting [`Query`] collection.
//!
//! [`Query`]: crate::Query

pub mod recap;

pub use self::recap::Recap;
