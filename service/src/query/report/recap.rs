//! [`Recap`] definition.

use std::{collections::HashMap, ops::RangeInclusive};

use common::{
    money::Currency,
    operations::{By, Select},
    DateTime, Money,
};
use rust_decimal::Decimal;
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::User;
use crate::{
    domain::{sale, user, Sale},
    infra::{database, Database},
    read,
    Query, Service,
};

/// [`Query`] to recap [`Sale`]s figures for a given period.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Recap {
    /// Start of the period.
    pub start: DateTime,

    /// End of the period.
    pub end: DateTime,
}

/// Output of the [`Recap`] [`Query`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Output {
    /// Total count of [`Sale`]s in the period.
    pub total_sales: read::sale::list::TotalCount,

    /// Rows of the report.
    pub rows: Vec<Row>,
}

/// Row in the [`Output`] of the [`Recap`] [`Query`], aggregating all the
/// [`Sale`]s a [`User`] made in the period in a single [`Currency`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Row {
    /// ID of the [`User`] the figures are aggregated for.
    pub user_id: user::Id,

    /// [`Currency`] the figures are aggregated in.
    pub currency: Currency,

    /// Number of [`Sale`]s the [`User`] made in the period.
    pub sales: read::sale::list::TotalCount,

    /// Total price of the [`Sale`]s.
    pub revenue: Money,

    /// Margin of the [`Sale`]s.
    pub margin: Money,

    /// Commission paid out to the [`User`].
    pub commission: Money,

    /// VR share paid out on the [`Sale`]s.
    pub vr: Money,

    /// What remains of the margin after both payouts.
    pub net: Money,
}

impl<Db> Query<Recap> for Service<Db>
where
    Db: Database<
        Select<By<Vec<Sale>, RangeInclusive<sale::CreationDateTime>>>,
        Ok = Vec<Sale>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Output;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Recap { start, end }: Recap,
    ) -> Result<Self::Ok, Self::Err> {
        let range = RangeInclusive::new(start.coerce(), end.coerce());

        let sales = self
            .database()
            .execute(Select(By::<Vec<Sale>, _>::new(range)))
            .await
            .map_err(tracerr::wrap!())?;

        let total_sales = i32::try_from(sales.len())
            .unwrap_or(i32::MAX)
            .into();

        let mut rows = HashMap::<(user::Id, Currency), Row>::new();
        for sale in &sales {
            let currency = sale.price.currency;
            let row = rows
                .entry((sale.seller_id(), currency))
                .or_insert_with(|| Row {
                    user_id: sale.seller_id(),
                    currency,
                    sales: 0.into(),
                    revenue: Money {
                        amount: Decimal::ZERO,
                        currency,
                    },
                    margin: Money {
                        amount: Decimal::ZERO,
                        currency,
                    },
                    commission: Money {
                        amount: Decimal::ZERO,
                        currency,
                    },
                    vr: Money {
                        amount: Decimal::ZERO,
                        currency,
                    },
                    net: Money {
                        amount: Decimal::ZERO,
                        currency,
                    },
                });

            row.sales = (i32::from(row.sales) + 1).into();
            row.revenue.amount += sale.total_price().amount;
            row.margin.amount += sale.margin().amount;
            row.commission.amount += sale.commission_amount().amount;
            row.vr.amount += sale.vr_amount().amount;
            row.net.amount += sale.net_contribution().amount;
        }

        Ok(Output {
            total_sales,
            rows: rows.into_values().collect(),
        })
    }
}
