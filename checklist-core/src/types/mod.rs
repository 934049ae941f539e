pub mod account;
pub mod report;

pub use account::{Account, Group};
pub use report::CheckReport;
