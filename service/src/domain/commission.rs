//! [`Commission`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf, Percent};
use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{product, user};
#[cfg(doc)]
use crate::domain::{Product, Sale, User};

/// Commission rate a [`User`] earns on [`Sale`]s of a [`Product`].
///
/// At most one [`Commission`] exists per ([`Product`], [`User`]) pair. A
/// [`User`] without one earns nothing on that [`Product`].
#[derive(Clone, Debug)]
pub struct Commission {
    /// ID of this [`Commission`].
    pub id: Id,

    /// ID of the [`Product`] this [`Commission`] applies to.
    pub product_id: product::Id,

    /// ID of the [`User`] earning this [`Commission`].
    pub user_id: user::Id,

    /// Commission rate itself.
    pub percent_com: Percent,

    /// [`DateTime`] when this [`Commission`] was created.
    pub created_at: CreationDateTime,
}

/// ID of a [`Commission`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// [`DateTime`] when a [`Commission`] was created.
pub type CreationDateTime = DateTimeOf<(Commission, unit::Creation)>;
