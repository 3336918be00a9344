//! [`Sale`] definitions.

use common::{unit, DateTime, DateTimeOf, Money, Percent};
use derive_more::{Display, Error, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{contact, product, user, Commission, Product};
#[cfg(doc)]
use crate::domain::{Contact, User};

/// Sale of a [`Product`] recorded by a [`User`].
///
/// The VR and commission rates are snapshotted from the [`Product`] and the
/// matching [`Commission`] row once, at recording time, and never change
/// afterwards: later edits of the catalog must not retroactively affect
/// historical sales.
#[derive(Clone, Debug)]
pub struct Sale {
    /// ID of this [`Sale`].
    pub id: Id,

    /// ID of the [`User`] who sold the [`Product`].
    pub(crate) seller_id: user::Id,

    /// ID of the sold [`Product`].
    pub(crate) product_id: product::Id,

    /// IDs of the buyer [`Contact`]s.
    pub contact_ids: Vec<contact::Id>,

    /// Unit price of the sold [`Product`].
    pub price: Money,

    /// Number of sold units.
    pub quantity: Quantity,

    /// Absolute discount subtracted from the total price.
    pub discount: Money,

    /// VR rate snapshotted from the [`Product`] at recording time.
    pub(crate) percent_vr: Percent,

    /// Commission rate snapshotted from the matching [`Commission`] row at
    /// recording time ([`Percent::ZERO`] if none existed).
    pub(crate) percent_com: Percent,

    /// Indicator whether this [`Sale`] has been invoiced.
    pub(crate) invoiced: bool,

    /// [`DateTime`] when this [`Sale`] was invoiced, if it was.
    pub(crate) invoiced_at: Option<InvoicingDateTime>,

    /// [`DateTime`] when this [`Sale`] was recorded.
    pub created_at: CreationDateTime,
}

impl Sale {
    /// Records a new [`Sale`], snapshotting the VR rate from the sold
    /// [`Product`] and the commission rate from the [`Commission`] row
    /// matching the seller (or [`Percent::ZERO`] if there is none).
    ///
    /// # Errors
    ///
    /// If the provided `price` or `discount` is invalid.
    #[expect(clippy::too_many_arguments, reason = "still readable")]
    pub fn record(
        seller_id: user::Id,
        product: &Product,
        contact_ids: Vec<contact::Id>,
        price: Money,
        quantity: Quantity,
        discount: Money,
        commission: Option<&Commission>,
    ) -> Result<Self, ValidationError> {
        Self::validate(&price, &discount)?;

        Ok(Self {
            id: Id::new(),
            seller_id,
            product_id: product.id,
            contact_ids,
            price,
            quantity,
            discount,
            percent_vr: product.percent_vr,
            percent_com: commission
                .map_or(Percent::ZERO, |c| c.percent_com),
            invoiced: false,
            invoiced_at: None,
            created_at: DateTime::now().coerce(),
        })
    }

    /// Updates the commercial terms of this [`Sale`].
    ///
    /// The snapshotted rates and the invoicing state are deliberately out of
    /// reach here.
    ///
    /// # Errors
    ///
    /// If the provided `price` or `discount` is invalid.
    pub fn update_terms(
        &mut self,
        contact_ids: Vec<contact::Id>,
        price: Money,
        quantity: Quantity,
        discount: Money,
    ) -> Result<(), ValidationError> {
        Self::validate(&price, &discount)?;

        self.contact_ids = contact_ids;
        self.price = price;
        self.quantity = quantity;
        self.discount = discount;
        Ok(())
    }

    /// Validates the provided `price` and `discount` of a [`Sale`].
    fn validate(
        price: &Money,
        discount: &Money,
    ) -> Result<(), ValidationError> {
        use ValidationError as E;

        if price.is_negative() {
            return Err(E::NegativePrice);
        }
        if discount.is_negative() {
            return Err(E::NegativeDiscount);
        }
        if discount.currency != price.currency {
            return Err(E::DiscountCurrencyMismatch);
        }
        Ok(())
    }

    /// Returns ID of the [`User`] who sold the [`Product`].
    #[must_use]
    pub fn seller_id(&self) -> user::Id {
        self.seller_id
    }

    /// Returns ID of the sold [`Product`].
    #[must_use]
    pub fn product_id(&self) -> product::Id {
        self.product_id
    }

    /// Returns the snapshotted VR rate of this [`Sale`].
    #[must_use]
    pub fn percent_vr(&self) -> Percent {
        self.percent_vr
    }

    /// Returns the snapshotted commission rate of this [`Sale`].
    #[must_use]
    pub fn percent_com(&self) -> Percent {
        self.percent_com
    }

    /// Returns the total price of this [`Sale`].
    ///
    /// A zero [`quantity`] degenerates to the unit [`price`] itself.
    ///
    /// [`price`]: Sale::price
    /// [`quantity`]: Sale::quantity
    #[must_use]
    pub fn total_price(&self) -> Money {
        let amount = if self.quantity == 0 {
            self.price.amount
        } else {
            self.price.amount * Decimal::from(self.quantity)
        };
        Money {
            amount,
            currency: self.price.currency,
        }
    }

    /// Returns the margin of this [`Sale`]: its [`total_price()`] minus the
    /// [`discount`].
    ///
    /// May be negative if the [`discount`] exceeds the [`total_price()`];
    /// this is not clamped.
    ///
    /// [`discount`]: Sale::discount
    /// [`total_price()`]: Sale::total_price
    #[must_use]
    pub fn margin(&self) -> Money {
        Money {
            amount: self.total_price().amount - self.discount.amount,
            currency: self.price.currency,
        }
    }

    /// Returns the seller's commission payout:
    /// `margin * percent_com / 100`, rounded to cents.
    #[must_use]
    pub fn commission_amount(&self) -> Money {
        Money {
            amount: self.percent_com.of(self.margin().amount).round_dp(2),
            currency: self.price.currency,
        }
    }

    /// Returns the VR payout: `margin * (percent_vr - percent_com) / 100`,
    /// rounded to cents.
    ///
    /// The result is signed: a commission rate exceeding the VR rate yields
    /// a negative payout. Nothing enforces `percent_com <= percent_vr`.
    #[must_use]
    pub fn vr_amount(&self) -> Money {
        let rate = self.percent_vr.as_decimal() - self.percent_com.as_decimal();
        Money {
            amount: (self.margin().amount * rate / Decimal::ONE_HUNDRED)
                .round_dp(2),
            currency: self.price.currency,
        }
    }

    /// Returns what remains of the [`margin()`] after paying out the
    /// commission and the VR share.
    ///
    /// [`margin()`]: Sale::margin
    #[must_use]
    pub fn net_contribution(&self) -> Money {
        Money {
            amount: self.margin().amount
                - self.commission_amount().amount
                - self.vr_amount().amount,
            currency: self.price.currency,
        }
    }

    /// Returns whether this [`Sale`] has been invoiced.
    #[must_use]
    pub fn is_invoiced(&self) -> bool {
        self.invoiced
    }

    /// Returns [`DateTime`] when this [`Sale`] was invoiced, if it was.
    #[must_use]
    pub fn invoiced_at(&self) -> Option<InvoicingDateTime> {
        self.invoiced_at
    }

    /// Marks this [`Sale`] as invoiced at the provided [`DateTime`].
    ///
    /// Idempotent: once invoiced, repeated calls leave the invoicing
    /// timestamp unchanged. There is no reverse transition.
    pub fn mark_invoiced(&mut self, at: InvoicingDateTime) {
        if self.invoiced_at.is_none() {
            self.invoiced_at = Some(at);
        }
        self.invoiced = true;
    }
}

/// ID of a [`Sale`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Number of units sold in a [`Sale`].
pub type Quantity = u16;

/// Error of validating a [`Sale`] being recorded.
#[derive(Clone, Copy, Debug, Display, Error, Eq, PartialEq)]
pub enum ValidationError {
    /// Discount is in another currency than the unit price.
    #[display("`discount` currency differs from the `price` one")]
    DiscountCurrencyMismatch,

    /// Discount is negative.
    #[display("`discount` cannot be negative")]
    NegativeDiscount,

    /// Unit price is negative.
    #[display("`price` cannot be negative")]
    NegativePrice,
}

/// [`DateTime`] when a [`Sale`] was recorded.
pub type CreationDateTime = DateTimeOf<(Sale, unit::Creation)>;

/// [`DateTime`] when a [`Sale`] was invoiced.
pub type InvoicingDateTime = DateTimeOf<(Sale, unit::Invoicing)>;

#[cfg(test)]
mod spec {
    use common::{money::Currency, DateTime, Money, Percent};
    use rust_decimal::Decimal;

    use crate::domain::{commission, product, user, Commission, Product};

    use super::{Sale, ValidationError};

    fn decimal(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn eur(s: &str) -> Money {
        Money {
            amount: decimal(s),
            currency: Currency::Eur,
        }
    }

    fn percent(s: &str) -> Percent {
        Percent::new(decimal(s)).unwrap()
    }

    fn product(percent_vr: &str) -> Product {
        Product {
            id: product::Id::new(),
            name: product::Name::new("VIP package").unwrap(),
            kind: product::Kind::PackageVip,
            percent_vr: percent(percent_vr),
            purchase_price: eur("0"),
            created_at: DateTime::now().coerce(),
        }
    }

    fn commission(product: &Product, seller_id: user::Id, rate: &str) -> Commission {
        Commission {
            id: commission::Id::new(),
            product_id: product.id,
            user_id: seller_id,
            percent_com: percent(rate),
            created_at: DateTime::now().coerce(),
        }
    }

    fn sale(
        price: &str,
        quantity: u16,
        discount: &str,
        percent_vr: &str,
        percent_com: &str,
    ) -> Sale {
        let seller_id = user::Id::new();
        let product = product(percent_vr);
        let com = commission(&product, seller_id, percent_com);
        Sale::record(
            seller_id,
            &product,
            vec![],
            eur(price),
            quantity,
            eur(discount),
            Some(&com),
        )
        .unwrap()
    }

    #[test]
    fn derives_all_figures() {
        let sale = sale("250.00", 2, "50.00", "20", "5");

        assert_eq!(sale.total_price(), eur("500.00"));
        assert_eq!(sale.margin(), eur("450.00"));
        assert_eq!(sale.commission_amount(), eur("22.50"));
        assert_eq!(sale.vr_amount(), eur("67.50"));
        assert_eq!(sale.net_contribution(), eur("360.00"));
    }

    #[test]
    fn zero_quantity_degenerates_to_unit_price() {
        let sale = sale("199.99", 0, "0", "20", "5");

        assert_eq!(sale.total_price(), eur("199.99"));
        assert_eq!(sale.margin(), eur("199.99"));
    }

    #[test]
    fn commission_rate_boundaries() {
        let none = sale("100", 1, "0", "20", "0");
        assert_eq!(none.commission_amount(), eur("0.00"));
        assert_eq!(none.vr_amount(), eur("20.00"));

        let all = sale("100", 1, "0", "100", "100");
        assert_eq!(all.commission_amount(), eur("100.00"));
        assert_eq!(all.vr_amount(), eur("0.00"));
        assert_eq!(all.net_contribution(), eur("0.00"));
    }

    #[test]
    fn vr_payout_goes_negative_when_commission_exceeds_vr() {
        let sale = sale("100", 1, "0", "10", "20");

        assert_eq!(sale.margin(), eur("100"));
        assert_eq!(sale.commission_amount(), eur("20.00"));
        assert_eq!(sale.vr_amount(), eur("-10.00"));
        assert_eq!(sale.net_contribution(), eur("90.00"));
    }

    #[test]
    fn margin_goes_negative_when_discount_exceeds_total() {
        let sale = sale("10", 1, "25", "20", "5");

        assert_eq!(sale.margin(), eur("-15"));
        assert_eq!(sale.commission_amount(), eur("-0.75"));
    }

    #[test]
    fn payouts_always_sum_up_to_margin() {
        let sale = sale("99.99", 3, "0.01", "12.34", "5.67");

        let margin = sale.margin().amount;
        let paid = sale.commission_amount().amount
            + sale.vr_amount().amount
            + sale.net_contribution().amount;
        assert_eq!(margin, paid);
    }

    #[test]
    fn snapshots_rates_at_recording_time() {
        let seller_id = user::Id::new();
        let product = product("15");
        let com = commission(&product, seller_id, "7");

        let sale = Sale::record(
            seller_id,
            &product,
            vec![],
            eur("100"),
            1,
            eur("0"),
            Some(&com),
        )
        .unwrap();
        assert_eq!(sale.percent_vr(), percent("15"));
        assert_eq!(sale.percent_com(), percent("7"));
    }

    #[test]
    fn snapshots_zero_commission_rate_without_matching_row() {
        let product = product("15");

        let sale = Sale::record(
            user::Id::new(),
            &product,
            vec![],
            eur("100"),
            1,
            eur("0"),
            None,
        )
        .unwrap();
        assert_eq!(sale.percent_vr(), percent("15"));
        assert_eq!(sale.percent_com(), Percent::ZERO);
    }

    #[test]
    fn rejects_invalid_amounts() {
        let product = product("20");
        let record = |price: Money, discount: Money| {
            Sale::record(
                user::Id::new(),
                &product,
                vec![],
                price,
                1,
                discount,
                None,
            )
        };

        assert_eq!(
            record(eur("-1"), eur("0")).unwrap_err(),
            ValidationError::NegativePrice,
        );
        assert_eq!(
            record(eur("10"), eur("-1")).unwrap_err(),
            ValidationError::NegativeDiscount,
        );
        assert_eq!(
            record(
                eur("10"),
                Money {
                    amount: decimal("1"),
                    currency: Currency::Usd,
                },
            )
            .unwrap_err(),
            ValidationError::DiscountCurrencyMismatch,
        );
    }

    #[test]
    fn invoicing_is_one_way_and_idempotent() {
        let mut sale = sale("100", 1, "0", "20", "5");
        assert!(!sale.is_invoiced());
        assert_eq!(sale.invoiced_at(), None);

        let first = DateTime::now().coerce();
        sale.mark_invoiced(first);
        assert!(sale.is_invoiced());
        assert_eq!(sale.invoiced_at(), Some(first));

        let second = DateTime::now().coerce();
        sale.mark_invoiced(second);
        assert!(sale.is_invoiced());
        assert_eq!(sale.invoiced_at(), Some(first));
    }
}
