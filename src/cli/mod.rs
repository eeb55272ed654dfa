pub mod convert;
pub mod dashboard;
pub mod rates;
pub mod setup;
pub mod ui;
pub mod watch;
