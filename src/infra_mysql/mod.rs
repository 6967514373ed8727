mod user_store_mysql;
mod util;

pub use user_store_mysql::*;
