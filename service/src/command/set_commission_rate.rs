//! [`Command`] for setting a [`Commission`] rate.

use common::{
    operations::{By, Commit, Insert, Select, Transact, Transacted},
    DateTime, Percent,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::Sale;
use crate::{
    domain::{commission, product, user, Commission, Product, User},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for setting the [`Commission`] rate a [`User`] earns on
/// [`Sale`]s of a [`Product`].
///
/// Upserts the single [`Commission`] row of the ([`Product`], [`User`])
/// pair and returns the persisted row: when overwriting an existing rate,
/// the row keeps its original identity. Only affects [`Sale`]s recorded
/// afterwards: rates snapshotted into existing [`Sale`]s stay as they are.
#[derive(Clone, Copy, Debug)]
pub struct SetCommissionRate {
    /// ID of the [`Product`] the rate applies to.
    pub product_id: product::Id,

    /// ID of the [`User`] earning the rate.
    pub user_id: user::Id,

    /// The rate itself.
    pub percent_com: Percent,
}

impl<Db> Command<SetCommissionRate> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Product>, product::Id>>,
            Ok = Option<Product>,
            Err = Traced<database::Error>,
        >,
    Transacted<Db>: Database<
            Insert<Commission>,
            Ok = Commission,
            Err = Traced<database::Error>,
        > + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Commission;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: SetCommissionRate,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let SetCommissionRate {
            product_id,
            user_id,
            percent_com,
        } = cmd;

        let product = self
            .database()
            .execute(Select(By::<Option<Product>, _>::new(product_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ProductNotExists(product_id))
            .map_err(tracerr::wrap!())?;

        let user = self
            .database()
            .execute(Select(By::<Option<User>, _>::new(user_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(user_id))
            .map_err(tracerr::wrap!())?;

        let commission = Commission {
            id: commission::Id::new(),
            product_id: product.id,
            user_id: user.id,
            percent_com,
            created_at: DateTime::now().coerce(),
        };

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let commission = tx
            .execute(Insert(commission))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(commission)
    }
}

/// Error of [`SetCommissionRate`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Product`] with the provided ID does not exist.
    #[display("`Product(id: {_0})` does not exist")]
    ProductNotExists(#[error(not(source))] product::Id),

    /// [`User`] with the provided ID does not exist.
    #[display("`User(id: {_0})` does not exist")]
    UserNotExists(#[error(not(source))] user::Id),
}

#[cfg(test)]
mod spec {
    use common::{
        money::Currency,
        operations::{By, Commit, Insert, Select, Transact},
        DateTime, Handler, Money, Percent,
    };
    use futures::executor::block_on;
    use rust_decimal::Decimal;
    use tracerr::Traced;

    use crate::{
        domain::{commission, product, user, Commission, Product, User},
        infra::database,
        Service,
    };

    use super::SetCommissionRate;

    /// In-memory database holding a single persisted [`Commission`] row.
    #[derive(Clone, Debug)]
    struct Db {
        product: Product,
        user: User,
        stored: Commission,
    }

    impl Handler<Transact> for Db {
        type Ok = Self;
        type Err = Traced<database::Error>;

        async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
            Ok(self.clone())
        }
    }

    impl Handler<Commit> for Db {
        type Ok = ();
        type Err = Traced<database::Error>;

        async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
            Ok(())
        }
    }

    impl Handler<Select<By<Option<Product>, product::Id>>> for Db {
        type Ok = Option<Product>;
        type Err = Traced<database::Error>;

        async fn execute(
            &self,
            _: Select<By<Option<Product>, product::Id>>,
        ) -> Result<Self::Ok, Self::Err> {
            Ok(Some(self.product.clone()))
        }
    }

    impl Handler<Select<By<Option<User>, user::Id>>> for Db {
        type Ok = Option<User>;
        type Err = Traced<database::Error>;

        async fn execute(
            &self,
            _: Select<By<Option<User>, user::Id>>,
        ) -> Result<Self::Ok, Self::Err> {
            Ok(Some(self.user.clone()))
        }
    }

    impl Handler<Insert<Commission>> for Db {
        type Ok = Commission;
        type Err = Traced<database::Error>;

        // Upsert conflict path: the stored row keeps its identity, only the
        // rate is overwritten.
        async fn execute(
            &self,
            Insert(commission): Insert<Commission>,
        ) -> Result<Self::Ok, Self::Err> {
            Ok(Commission {
                percent_com: commission.percent_com,
                ..self.stored.clone()
            })
        }
    }

    fn percent(rate: u32) -> Percent {
        Percent::new(Decimal::from(rate)).unwrap()
    }

    #[test]
    fn overwriting_a_rate_returns_the_persisted_identity() {
        let product = Product {
            id: product::Id::new(),
            name: product::Name::new("VIP package").unwrap(),
            kind: product::Kind::PackageVip,
            percent_vr: percent(20),
            purchase_price: Money {
                amount: Decimal::ZERO,
                currency: Currency::Eur,
            },
            created_at: DateTime::now().coerce(),
        };
        let user = User {
            id: user::Id::new(),
            name: user::Name::new("Jane Doe").unwrap(),
            email: user::Email::new("jane@corp.test").unwrap(),
            created_at: DateTime::now().coerce(),
        };
        let stored = Commission {
            id: commission::Id::new(),
            product_id: product.id,
            user_id: user.id,
            percent_com: percent(5),
            created_at: DateTime::now().coerce(),
        };
        let service = Service::new(Db {
            product: product.clone(),
            user: user.clone(),
            stored: stored.clone(),
        });

        let commission = block_on(service.execute(SetCommissionRate {
            product_id: product.id,
            user_id: user.id,
            percent_com: percent(7),
        }))
        .unwrap();

        assert_eq!(commission.id, stored.id);
        assert_eq!(commission.created_at, stored.created_at);
        assert_eq!(commission.percent_com, percent(7));
    }
}
