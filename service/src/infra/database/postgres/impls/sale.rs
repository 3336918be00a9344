//! [`Sale`]-related [`Database`] implementations.

use std::{collections::HashMap, ops::RangeInclusive};

use common::{
    money,
    operations::{By, Insert, Lock, Select, Update},
    Money, Percent,
};
use itertools::Itertools as _;
use postgres_types::ToSql;
use rust_decimal::Decimal;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{contact, product, sale, user, Sale},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read::{self, Pending},
};

/// Decodes a [`Sale`] from the provided [`Row`].
fn decode(row: &Row) -> Sale {
    Sale {
        id: row.get("id"),
        seller_id: row.get("seller_id"),
        product_id: row.get("product_id"),
        contact_ids: row.get("contact_ids"),
        price: Money {
            amount: row.get("price"),
            currency: row.get("price_currency"),
        },
        quantity: u16::try_from(row.get::<_, i32>("quantity"))
            .expect("fits into `u16`"),
        discount: Money {
            amount: row.get("discount"),
            currency: row.get("discount_currency"),
        },
        percent_vr: row.get("percent_vr"),
        percent_com: row.get("percent_com"),
        invoiced: row.get("invoiced"),
        invoiced_at: row.get("invoiced_at"),
        created_at: row.get("created_at"),
    }
}

/// Columns of the `sales` table every [`Sale`] select lists.
const COLUMNS: &str = "\
    s.id, s.seller_id, s.product_id, \
    s.price, s.price_currency, \
    s.quantity, \
    s.discount, s.discount_currency, \
    s.percent_vr, s.percent_com, \
    s.invoiced, s.invoiced_at, \
    s.created_at, \
    ARRAY(\
        SELECT sc.contact_id \
        FROM sale_contacts sc \
        WHERE sc.sale_id = s.id\
    ) AS contact_ids";

impl<C, IDs> Database<Select<By<HashMap<sale::Id, Sale>, IDs>>> for Postgres<C>
where
    C: Connection,
    IDs: AsRef<[sale::Id]>,
{
    type Ok = HashMap<sale::Id, Sale>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HashMap<sale::Id, Sale>, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        // Avoid subtle change for SQL.
        let ids: &[sale::Id] = ids.as_ref();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let limit = i32::try_from(ids.len()).unwrap();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM sales s \
             WHERE s.id IN (SELECT unnest($1::UUID[]) LIMIT $2::INT4) \
             LIMIT $2::INT4",
        );
        Ok(self
            .query(&sql, &[&ids, &limit])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(|row| {
                let sale = decode(row);
                (sale.id, sale)
            })
            .collect())
    }
}

impl<C> Database<Select<By<Option<Sale>, sale::Id>>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<By<HashMap<sale::Id, Sale>, [sale::Id; 1]>>,
        Ok = HashMap<sale::Id, Sale>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<Sale>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Sale>, sale::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .execute(Select(By::new([id])))
            .await
            .map_err(tracerr::wrap!())?
            .remove(&id))
    }
}

impl<C> Database<Insert<Sale>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Sale>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(sale): Insert<Sale>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(sale)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Sale>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(sale): Update<Sale>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        #[expect(clippy::type_complexity, reason = "still readable")]
        let (
            id,
            seller_id,
            product_id,
            contact_ids,
            price,
            price_currency,
            quantity,
            discount,
            discount_currency,
            percent_vr,
            percent_com,
            invoiced,
            invoiced_at,
            created_at,
        ): (
            sale::Id,
            user::Id,
            product::Id,
            Vec<contact::Id>,
            Decimal,
            money::Currency,
            i32,
            Decimal,
            money::Currency,
            Percent,
            Percent,
            bool,
            Option<sale::InvoicingDateTime>,
            sale::CreationDateTime,
        ) = (
            sale.id,
            sale.seller_id,
            sale.product_id,
            sale.contact_ids,
            sale.price.amount,
            sale.price.currency,
            i32::from(sale.quantity),
            sale.discount.amount,
            sale.discount.currency,
            sale.percent_vr,
            sale.percent_com,
            sale.invoiced,
            sale.invoiced_at,
            sale.created_at,
        );

        const SQL: &str = "\
            INSERT INTO sales (\
                id, seller_id, product_id, \
                price, price_currency, \
                quantity, \
                discount, discount_currency, \
                percent_vr, percent_com, \
                invoiced, invoiced_at, \
                created_at\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, $3::UUID, \
                $4::NUMERIC, $5::INT2, \
                $6::INT4, \
                $7::NUMERIC, $8::INT2, \
                $9::NUMERIC, $10::NUMERIC, \
                $11::BOOLEAN, $12::TIMESTAMPTZ, \
                $13::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET seller_id = EXCLUDED.seller_id, \
                product_id = EXCLUDED.product_id, \
                price = EXCLUDED.price, \
                price_currency = EXCLUDED.price_currency, \
                quantity = EXCLUDED.quantity, \
                discount = EXCLUDED.discount, \
                discount_currency = EXCLUDED.discount_currency, \
                percent_vr = EXCLUDED.percent_vr, \
                percent_com = EXCLUDED.percent_com, \
                invoiced = EXCLUDED.invoiced, \
                invoiced_at = EXCLUDED.invoiced_at, \
                created_at = EXCLUDED.created_at";
        self.exec(
            SQL,
            &[
                &id,
                &seller_id,
                &product_id,
                &price,
                &price_currency,
                &quantity,
                &discount,
                &discount_currency,
                &percent_vr,
                &percent_com,
                &invoiced,
                &invoiced_at,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)?;

        const DELETE_CONTACTS_SQL: &str = "\
            DELETE FROM sale_contacts \
            WHERE sale_id = $1::UUID";
        self.exec(DELETE_CONTACTS_SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)?;

        if contact_ids.is_empty() {
            return Ok(());
        }
        const INSERT_CONTACTS_SQL: &str = "\
            INSERT INTO sale_contacts (sale_id, contact_id) \
            SELECT $1::UUID, unnest($2::UUID[])";
        self.exec(INSERT_CONTACTS_SQL, &[&id, &contact_ids])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Lock<By<Sale, sale::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Sale, sale::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: sale::Id = by.into_inner();

        // `DO UPDATE` takes a row-level lock even when the lock row already
        // exists, while `DO NOTHING` would let a concurrent transaction
        // proceed past an existing row without blocking.
        const SQL: &str = "\
            INSERT INTO sales_lock \
            VALUES ($1::UUID) \
            ON CONFLICT (id) DO UPDATE \
            SET id = EXCLUDED.id";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Select<By<Option<Pending<Sale>>, ()>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Pending<Sale>>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(_): Select<By<Option<Pending<Sale>>, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        let sql = format!(
            "SELECT {COLUMNS} \
             FROM sales s \
             WHERE NOT s.invoiced \
             ORDER BY s.created_at ASC, s.id ASC \
             LIMIT 1",
        );
        Ok(self
            .query_opt(&sql, &[])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| Pending(decode(&row))))
    }
}

impl<C> Database<Select<By<Vec<Sale>, RangeInclusive<sale::CreationDateTime>>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Sale>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<Vec<Sale>, RangeInclusive<sale::CreationDateTime>>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let range: RangeInclusive<sale::CreationDateTime> = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM sales s \
             WHERE s.created_at >= $1::TIMESTAMPTZ \
               AND s.created_at <= $2::TIMESTAMPTZ \
             ORDER BY s.created_at ASC, s.id ASC",
        );
        Ok(self
            .query(&sql, &[range.start(), range.end()])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(decode)
            .collect())
    }
}

impl<C> Database<Select<By<read::sale::list::Page, read::sale::list::Selector>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = read::sale::list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::sale::list::Page, read::sale::list::Selector>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::sale::list::Selector {
            arguments,
            filter: read::sale::list::Filter { seller, invoiced },
        } = by.into_inner();

        let limit = i32::try_from(arguments.limit()).unwrap() + 1;

        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![&limit];

        let cursor_idx = arguments.cursor().map(|c| {
            ps.push(c);
            ps.len()
        });
        let seller_idx = seller.as_ref().map(|s| {
            ps.push(s);
            ps.len()
        });
        let invoiced_idx = invoiced.as_ref().map(|i| {
            ps.push(i);
            ps.len()
        });

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM sales s \
             WHERE TRUE \
                   {cursor} \
                   {seller_filtering} \
                   {invoiced_filtering} \
             ORDER BY s.id {order} \
             LIMIT $1::INT4",
            cursor = cursor_idx.into_iter().format_with("", |idx, f| {
                let op = arguments.kind().operator();
                f(&format_args!("AND s.id {op} ${idx}::UUID"))
            }),
            order = arguments.kind().order().sql(),
            seller_filtering =
                seller_idx.into_iter().format_with("", |idx, f| {
                    f(&format_args!("AND s.seller_id = ${idx}::UUID"))
                }),
            invoiced_filtering =
                invoiced_idx.into_iter().format_with("", |idx, f| {
                    f(&format_args!("AND s.invoiced = ${idx}::BOOLEAN"))
                }),
        );
        let rows = self
            .query(&sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())?;

        let has_more = rows.len() > arguments.limit();
        let edges = rows
            .iter()
            .take(arguments.limit())
            .map(|row| {
                let sale = decode(row);
                (sale.id, sale)
            })
            .collect::<Vec<_>>();

        Ok(read::sale::list::Page::new(&arguments, edges, has_more))
    }
}

impl<C>
    Database<Select<By<read::sale::list::TotalCount, read::sale::list::Filter>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = read::sale::list::TotalCount;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::sale::list::TotalCount, read::sale::list::Filter>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let read::sale::list::Filter { seller, invoiced } = by.into_inner();

        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![];

        let seller_idx = seller.as_ref().map(|s| {
            ps.push(s);
            ps.len()
        });
        let invoiced_idx = invoiced.as_ref().map(|i| {
            ps.push(i);
            ps.len()
        });

        let sql = format!(
            "SELECT COUNT(*)::INT4 \
             FROM sales s \
             WHERE TRUE \
                   {seller_filtering} \
                   {invoiced_filtering}",
            seller_filtering =
                seller_idx.into_iter().format_with("", |idx, f| {
                    f(&format_args!("AND s.seller_id = ${idx}::UUID"))
                }),
            invoiced_filtering =
                invoiced_idx.into_iter().format_with("", |idx, f| {
                    f(&format_args!("AND s.invoiced = ${idx}::BOOLEAN"))
                }),
        );
        self.query_opt(&sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())
            .map(|row| row.expect("always exists").get::<_, i32>(0).into())
    }
}
