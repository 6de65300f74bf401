pub mod availability;
pub mod booking;
pub mod ledger;
pub mod lifecycle;
pub mod resolver;
pub mod slots;
