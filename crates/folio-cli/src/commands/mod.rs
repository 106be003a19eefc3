pub mod ddl;
pub mod store;
