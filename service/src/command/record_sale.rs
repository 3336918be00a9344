//! [`Command`] for recording a new [`Sale`].

use std::collections::HashMap;

use common::{
    operations::{By, Commit, Insert, Select, Transact, Transacted},
    Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        contact, product, sale, user, Commission, Contact, Product, Sale, User,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for recording a new [`Sale`].
#[derive(Clone, Debug)]
pub struct RecordSale {
    /// ID of the [`User`] who sells the [`Product`].
    pub seller_id: user::Id,

    /// ID of the sold [`Product`].
    pub product_id: product::Id,

    /// IDs of the buyer [`Contact`]s.
    pub contact_ids: Vec<contact::Id>,

    /// Unit price of the sold [`Product`].
    pub price: Money,

    /// Number of sold units.
    pub quantity: sale::Quantity,

    /// Absolute discount subtracted from the total price.
    pub discount: Money,
}

impl<Db> Command<RecordSale> for Service<Db>
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
        > + Database<
            Select<By<HashMap<contact::Id, Contact>, Vec<contact::Id>>>,
            Ok = HashMap<contact::Id, Contact>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Commission>, (product::Id, user::Id)>>,
            Ok = Option<Commission>,
            Err = Traced<database::Error>,
        >,
    Transacted<Db>: Database<Insert<Sale>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Sale;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: RecordSale) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let RecordSale {
            seller_id,
            product_id,
            contact_ids,
            price,
            quantity,
            discount,
        } = cmd;

        let seller = self
            .database()
            .execute(Select(By::<Option<User>, _>::new(seller_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(seller_id))
            .map_err(tracerr::wrap!())?;

        let product = self
            .database()
            .execute(Select(By::<Option<Product>, _>::new(product_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ProductNotExists(product_id))
            .map_err(tracerr::wrap!())?;

        let contacts = self
            .database()
            .execute(Select(By::<HashMap<contact::Id, Contact>, _>::new(
                contact_ids.clone(),
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        for id in &contact_ids {
            if !contacts.contains_key(id) {
                return Err(tracerr::new!(E::ContactNotExists(*id)));
            }
        }

        let commission = self
            .database()
            .execute(Select(By::<Option<Commission>, _>::new((
                product.id, seller.id,
            ))))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let sale = Sale::record(
            seller.id,
            &product,
            contact_ids,
            price,
            quantity,
            discount,
            commission.as_ref(),
        )
        .map_err(tracerr::from_and_wrap!(=> E))?;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Insert(sale.clone()))
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

/// Error of [`RecordSale`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Contact`] with the provided ID does not exist.
    #[display("`Contact(id: {_0})` does not exist")]
    ContactNotExists(#[error(not(source))] contact::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Provided [`Sale`] inputs are invalid.
    #[display("invalid `Sale`: {_0}")]
    #[from]
    InvalidSale(sale::ValidationError),

    /// [`Product`] with the provided ID does not exist.
    #[display("`Product(id: {_0})` does not exist")]
    ProductNotExists(#[error(not(source))] product::Id),

    /// [`User`] with the provided ID does not exist.
    #[display("`User(id: {_0})` does not exist")]
    UserNotExists(#[error(not(source))] user::Id),
}
