//! [`Command`] definition.

pub mod create_contact;
pub mod create_product;
pub mod create_user;
pub mod mark_sale_invoiced;
pub mod record_sale;
pub mod set_commission_rate;
pub mod update_sale;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    create_contact::CreateContact, create_product::CreateProduct,
    create_user::CreateUser, mark_sale_invoiced::MarkSaleInvoiced,
    record_sale::RecordSale, set_commission_rate::SetCommissionRate,
    update_sale::UpdateSale,
};
