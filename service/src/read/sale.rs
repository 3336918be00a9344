//! [`Sale`] read model definition.

#[cfg(doc)]
use crate::domain::Sale;

/// Wrapper around a [`Sale`] indicating that it's not [`is_invoiced()`] yet.
///
/// [`is_invoiced()`]: Sale::is_invoiced
#[derive(Clone, Debug)]
pub struct Pending<T>(pub T);

pub mod list {
    //! [`Sale`]s list definitions.

    use common::define_pagination;
    use derive_more::{From, Into};

    use crate::domain::{sale, user, Sale};
    #[cfg(doc)]
    use crate::domain::User;

    define_pagination!(Cursor, Node, Filter);

    /// Node in a [`Connection`].
    pub type Node = Sale;

    /// Cursor pointing to a specific [`Sale`] in a list.
    pub type Cursor = sale::Id;

    /// Filter for [`Selector`].
    #[derive(Clone, Copy, Debug, Default)]
    pub struct Filter {
        /// ID of the [`User`] whose [`Sale`]s to select only.
        pub seller: Option<user::Id>,

        /// Invoicing state to select [`Sale`]s in only.
        pub invoiced: Option<bool>,
    }

    /// Total count of [`Sale`]s.
    #[derive(Clone, Copy, Debug, Eq, From, Hash, Into, PartialEq)]
    pub struct TotalCount(i32);
}
