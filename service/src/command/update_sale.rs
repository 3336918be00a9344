//! [`Command`] for updating the commercial terms of a [`Sale`].

use std::collections::HashMap;

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{contact, sale, Contact, Sale},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for updating the commercial terms of a [`Sale`].
///
/// The rates snapshotted at recording time and the invoicing state are
/// untouchable by this [`Command`].
#[derive(Clone, Debug)]
pub struct UpdateSale {
    /// ID of the [`Sale`] to be updated.
    pub sale_id: sale::Id,

    /// New IDs of the buyer [`Contact`]s.
    pub contact_ids: Vec<contact::Id>,

    /// New unit price.
    pub price: Money,

    /// New number of sold units.
    pub quantity: sale::Quantity,

    /// New absolute discount.
    pub discount: Money,
}

impl<Db> Command<UpdateSale> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<Sale>, sale::Id>>,
            Ok = Option<Sale>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<HashMap<contact::Id, Contact>, Vec<contact::Id>>>,
            Ok = HashMap<contact::Id, Contact>,
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

    async fn execute(&self, cmd: UpdateSale) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateSale {
            sale_id,
            contact_ids,
            price,
            quantity,
            discount,
        } = cmd;

        self.database()
            .execute(Select(By::<Option<Sale>, _>::new(sale_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::SaleNotExists(sale_id))
            .map_err(tracerr::wrap!())
            .map(drop)?;

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

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent actions upon the same `Sale`.
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

        sale.update_terms(contact_ids, price, quantity, discount)
            .map_err(tracerr::from_and_wrap!(=> E))?;

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

/// Error of [`UpdateSale`] [`Command`] execution.
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

    /// [`Sale`] with the provided ID does not exist.
    #[display("`Sale(id: {_0})` does not exist")]
    SaleNotExists(#[error(not(source))] sale::Id),
}
