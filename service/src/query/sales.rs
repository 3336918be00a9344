//! [`Query`] collection related to the multiple [`Sale`]s.

use common::operations::By;

use crate::read;
#[cfg(doc)]
use crate::{domain::Sale, Query};

use super::DatabaseQuery;

/// Queries a list of [`Sale`]s.
pub type List =
    DatabaseQuery<By<read::sale::list::Page, read::sale::list::Selector>>;

/// Queries total count of [`Sale`]s matching a [`Filter`].
///
/// [`Filter`]: read::sale::list::Filter
pub type TotalCount = DatabaseQuery<
    By<read::sale::list::TotalCount, read::sale::list::Filter>,
>;
