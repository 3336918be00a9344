//! [`Command`] for creating a new [`Product`].

use common::{
    operations::{Commit, Insert, Transact, Transacted},
    DateTime, Money, Percent,
};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::product::{Kind, Name};
use crate::{
    domain::{product, Product},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`Product`].
#[derive(Clone, Debug)]
pub struct CreateProduct {
    /// [`Name`] of a new [`Product`].
    pub name: product::Name,

    /// [`Kind`] of a new [`Product`].
    pub kind: product::Kind,

    /// Default VR rate of a new [`Product`].
    pub percent_vr: Percent,

    /// Purchase price of a new [`Product`].
    pub purchase_price: Money,
}

impl<Db> Command<CreateProduct> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<Insert<Product>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Product;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateProduct,
    ) -> Result<Self::Ok, Self::Err> {
        let CreateProduct {
            name,
            kind,
            percent_vr,
            purchase_price,
        } = cmd;

        let product = Product {
            id: product::Id::new(),
            name,
            kind,
            percent_vr,
            purchase_price,
            created_at: DateTime::now().coerce(),
        };

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::wrap!())?;

        tx.execute(Insert(product.clone()))
            .await
            .map_err(tracerr::wrap!())
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::wrap!())
            .map(drop)?;

        Ok(product)
    }
}

/// Error of [`CreateProduct`] [`Command`] execution.
pub type ExecutionError = database::Error;
