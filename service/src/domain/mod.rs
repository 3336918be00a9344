//! Domain definitions.

pub mod commission;
pub mod contact;
pub mod product;
pub mod sale;
pub mod user;

pub use self::{
    commission::Commission, contact::Contact, product::Product, sale::Sale,
    user::User,
};
