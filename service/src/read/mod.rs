//! Read entities definitions.

pub mod sale;

pub use self::sale::Pending;
