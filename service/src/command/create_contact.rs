//! [`Command`] for creating a new [`Contact`].

use common::{
    operations::{Commit, Insert, Transact, Transacted},
    DateTime,
};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::contact::{CompanyName, Email, FullName, Phone};
use crate::{
    domain::{contact, Contact},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`Contact`].
#[derive(Clone, Debug)]
pub struct CreateContact {
    /// [`FullName`] of a new [`Contact`].
    pub full_name: contact::FullName,

    /// [`CompanyName`] of a new [`Contact`].
    pub company: contact::CompanyName,

    /// [`Email`] of a new [`Contact`].
    pub email: contact::Email,

    /// [`Phone`] of a new [`Contact`].
    pub phone: Option<contact::Phone>,
}

impl<Db> Command<CreateContact> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<Insert<Contact>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Contact;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateContact,
    ) -> Result<Self::Ok, Self::Err> {
        let CreateContact {
            full_name,
            company,
            email,
            phone,
        } = cmd;

        let contact = Contact {
            id: contact::Id::new(),
            full_name,
            company,
            email,
            phone,
            created_at: DateTime::now().coerce(),
        };

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::wrap!())?;

        tx.execute(Insert(contact.clone()))
            .await
            .map_err(tracerr::wrap!())
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::wrap!())
            .map(drop)?;

        Ok(contact)
    }
}

/// Error of [`CreateContact`] [`Command`] execution.
pub type ExecutionError = database::Error;
