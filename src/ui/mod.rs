pub mod account_table;
pub mod banners;
pub mod bottom_bar;
pub mod details;
pub mod header;
pub mod help;
pub mod receipts;
pub mod select;
pub mod splash;
pub mod util;
