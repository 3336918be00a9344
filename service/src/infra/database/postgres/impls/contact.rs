//! [`Contact`]-related [`Database`] implementations.

use std::collections::HashMap;

use common::operations::{By, Insert, Select, Update};
use tracerr::Traced;

use crate::{
    domain::{contact, Contact},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

impl<C, IDs> Database<Select<By<HashMap<contact::Id, Contact>, IDs>>>
    for Postgres<C>
where
    C: Connection,
    IDs: AsRef<[contact::Id]>,
{
    type Ok = HashMap<contact::Id, Contact>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HashMap<contact::Id, Contact>, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        // Avoid subtle change for SQL.
        let ids: &[contact::Id] = ids.as_ref();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let limit = i32::try_from(ids.len()).unwrap();

        const SQL: &str = "\
            SELECT id, full_name, company, email, phone, created_at \
            FROM contacts \
            WHERE id IN (SELECT unnest($1::UUID[]) LIMIT $2::INT4) \
            LIMIT $2::INT4";
        Ok(self
            .query(SQL, &[&ids, &limit])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| {
                let id = row.get("id");
                (
                    id,
                    Contact {
                        id,
                        full_name: row.get("full_name"),
                        company: row.get("company"),
                        email: row.get("email"),
                        phone: row.get("phone"),
                        created_at: row.get("created_at"),
                    },
                )
            })
            .collect())
    }
}

impl<C> Database<Select<By<Option<Contact>, contact::Id>>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<By<HashMap<contact::Id, Contact>, [contact::Id; 1]>>,
        Ok = HashMap<contact::Id, Contact>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<Contact>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Contact>, contact::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .execute(Select(By::new([id])))
            .await
            .map_err(tracerr::wrap!())?
            .remove(&id))
    }
}

impl<C> Database<Insert<Contact>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Contact>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(contact): Insert<Contact>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(contact))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Contact>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(contact): Update<Contact>,
    ) -> Result<Self::Ok, Self::Err> {
        let Contact {
            id,
            full_name,
            company,
            email,
            phone,
            created_at,
        } = contact;

        const SQL: &str = "\
            INSERT INTO contacts (\
                id, full_name, company, email, phone, created_at\
            ) \
            VALUES (\
                $1::UUID, \
                $2::VARCHAR, $3::VARCHAR, \
                $4::VARCHAR, $5::VARCHAR, \
                $6::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET full_name = EXCLUDED.full_name, \
                company = EXCLUDED.company, \
                email = EXCLUDED.email, \
                phone = EXCLUDED.phone, \
                created_at = EXCLUDED.created_at";
        self.exec(
            SQL,
            &[&id, &full_name, &company, &email, &phone, &created_at],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}
