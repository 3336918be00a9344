//! [`Commission`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select, Update};
use tracerr::Traced;

use crate::{
    domain::{product, user, Commission},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

impl<C> Database<Select<By<Option<Commission>, (product::Id, user::Id)>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Commission>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Commission>, (product::Id, user::Id)>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let (product_id, user_id): (product::Id, user::Id) = by.into_inner();

        const SQL: &str = "\
            SELECT id, product_id, user_id, percent_com, created_at \
            FROM commissions \
            WHERE product_id = $1::UUID \
              AND user_id = $2::UUID \
            LIMIT 1";
        Ok(self
            .query_opt(SQL, &[&product_id, &user_id])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| Commission {
                id: row.get("id"),
                product_id: row.get("product_id"),
                user_id: row.get("user_id"),
                percent_com: row.get("percent_com"),
                created_at: row.get("created_at"),
            }))
    }
}

impl<C> Database<Insert<Commission>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Update<Commission>,
        Ok = Commission,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Commission;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(commission): Insert<Commission>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(commission))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Commission>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Commission;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(commission): Update<Commission>,
    ) -> Result<Self::Ok, Self::Err> {
        let Commission {
            id,
            product_id,
            user_id,
            percent_com,
            created_at,
        } = commission;

        // The `(product_id, user_id)` pair is unique, so setting a rate for
        // an already covered pair overwrites the existing row, keeping its
        // `id` and `created_at`. `RETURNING` hands the persisted row back.
        const SQL: &str = "\
            INSERT INTO commissions (\
                id, product_id, user_id, percent_com, created_at\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, $3::UUID, $4::NUMERIC, $5::TIMESTAMPTZ\
            ) \
            ON CONFLICT (product_id, user_id) DO UPDATE \
            SET percent_com = EXCLUDED.percent_com \
            RETURNING id, product_id, user_id, percent_com, created_at";
        self.query_opt(
            SQL,
            &[&id, &product_id, &user_id, &percent_com, &created_at],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(|row| {
            let row = row.expect("always exists");
            Commission {
                id: row.get("id"),
                product_id: row.get("product_id"),
                user_id: row.get("user_id"),
                percent_com: row.get("percent_com"),
                created_at: row.get("created_at"),
            }
        })
    }
}
