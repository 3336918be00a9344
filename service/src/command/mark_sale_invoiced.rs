//! [`Command`] for marking a [`Sale`] as invoiced.

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{sale, Sale},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for marking a [`Sale`] as invoiced.
///
/// Idempotent: invoicing an already invoiced [`Sale`] succeeds and leaves
/// its invoicing timestamp unchanged.
#[derive(Clone, Copy, Debug)]
pub struct MarkSaleInvoiced {
    /// ID of the [`Sale`] to be invoiced.
    pub sale_id: sale::Id,
}

impl<Db> Command<MarkSaleInvoiced> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<Sale>, sale::Id>>,
            Ok = Option<Sale>,
            Err = Traced<database::Error>,
        >,
    Transacted<Db>: Database<
            Lock<By<Sale, sale::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Sale>, sale::Id>>,
            Ok = Option<Sale>,
            Err = Traced<database::Error>,
        > + Database<Update<Sale>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Sale;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: MarkSaleInvoiced,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let MarkSaleInvoiced { sale_id } = cmd;

        self.database()
            .execute(Select(By::<Option<Sale>, _>::new(sale_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::SaleNotExists(sale_id))
            .map_err(tracerr::wrap!())
            .map(drop)?;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent invoicing of the same `Sale`, so its timestamp
        // cannot be set twice.
        tx.execute(Lock(By::new(sale_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut sale = tx
            .execute(Select(By::<Option<Sale>, _>::new(sale_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::SaleNotExists(sale_id))
            .map_err(tracerr::wrap!())?;

        if sale.is_invoiced() {
            log::debug!("`Sale(id: {sale_id})` is already invoiced");
        }
        sale.mark_invoiced(DateTime::now().coerce());

        tx.execute(Update(sale.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(sale)
    }
}

/// Error of [`MarkSaleInvoiced`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Sale`] with the provided ID does not exist.
    #[display("`Sale(id: {_0})` does not exist")]
    SaleNotExists(#[error(not(source))] sale::Id),
}

#[cfg(test)]
mod spec {
    use std::sync::{Arc, Mutex};

    use common::{
        money::Currency,
        operations::{By, Commit, Lock, Select, Transact, Update},
        DateTime, Handler, Money, Percent,
    };
    use futures::executor::block_on;
    use rust_decimal::Decimal;
    use tracerr::Traced;

    use crate::{
        domain::{product, sale, user, Product, Sale},
        infra::database,
        Service,
    };

    use super::MarkSaleInvoiced;

    /// In-memory database holding a single [`Sale`].
    #[derive(Clone, Debug)]
    struct Db(Arc<Mutex<Sale>>);

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

    impl Handler<Lock<By<Sale, sale::Id>>> for Db {
        type Ok = ();
        type Err = Traced<database::Error>;

        async fn execute(
            &self,
            _: Lock<By<Sale, sale::Id>>,
        ) -> Result<Self::Ok, Self::Err> {
            Ok(())
        }
    }

    impl Handler<Select<By<Option<Sale>, sale::Id>>> for Db {
        type Ok = Option<Sale>;
        type Err = Traced<database::Error>;

        async fn execute(
            &self,
            _: Select<By<Option<Sale>, sale::Id>>,
        ) -> Result<Self::Ok, Self::Err> {
            Ok(Some(self.0.lock().unwrap().clone()))
        }
    }

    impl Handler<Update<Sale>> for Db {
        type Ok = ();
        type Err = Traced<database::Error>;

        async fn execute(
            &self,
            Update(sale): Update<Sale>,
        ) -> Result<Self::Ok, Self::Err> {
            *self.0.lock().unwrap() = sale;
            Ok(())
        }
    }

    fn pending_sale() -> Sale {
        let product = Product {
            id: product::Id::new(),
            name: product::Name::new("VIP package").unwrap(),
            kind: product::Kind::PackageVip,
            percent_vr: Percent::new(Decimal::from(20)).unwrap(),
            purchase_price: Money {
                amount: Decimal::ZERO,
                currency: Currency::Eur,
            },
            created_at: DateTime::now().coerce(),
        };
        Sale::record(
            user::Id::new(),
            &product,
            vec![],
            Money {
                amount: Decimal::from(100),
                currency: Currency::Eur,
            },
            1,
            Money {
                amount: Decimal::ZERO,
                currency: Currency::Eur,
            },
            None,
        )
        .unwrap()
    }

    #[test]
    fn sets_the_timestamp_at_most_once() {
        let sale = pending_sale();
        let sale_id = sale.id;
        let db = Db(Arc::new(Mutex::new(sale)));
        let service = Service::new(db.clone());

        let invoiced =
            block_on(service.execute(MarkSaleInvoiced { sale_id })).unwrap();
        assert!(invoiced.is_invoiced());
        let first = invoiced.invoiced_at().unwrap();

        let again =
            block_on(service.execute(MarkSaleInvoiced { sale_id })).unwrap();
        assert_eq!(again.invoiced_at(), Some(first));
        assert_eq!(db.0.lock().unwrap().invoiced_at(), Some(first));
    }

    #[test]
    fn keeps_the_timestamp_observed_after_locking() {
        // An invoicing that lands after another one committed must see its
        // timestamp on the post-lock re-select and leave it untouched.
        let mut sale = pending_sale();
        let sale_id = sale.id;
        let first = DateTime::now().coerce();
        sale.mark_invoiced(first);
        let db = Db(Arc::new(Mutex::new(sale)));
        let service = Service::new(db.clone());

        let invoiced =
            block_on(service.execute(MarkSaleInvoiced { sale_id })).unwrap();
        assert_eq!(invoiced.invoiced_at(), Some(first));
        assert_eq!(db.0.lock().unwrap().invoiced_at(), Some(first));
    }
}
