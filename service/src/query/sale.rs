//! [`Query`] collection related to a single [`Sale`].

use common::operations::By;

use crate::{
    domain::{sale, Sale},
    read::Pending,
};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a [`Sale`] by its [`sale::Id`].
pub type ById = DatabaseQuery<By<Option<Sale>, sale::Id>>;

/// Queries the oldest [`Sale`] not invoiced yet, if any.
pub type NextPending = DatabaseQuery<By<Option<Pending<Sale>>, ()>>;
