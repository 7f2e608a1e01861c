pub mod ledger;
pub mod orders;
pub mod partitions;
pub mod products;
pub mod reports;
pub mod suppliers;
