// Library for tests to access modules

pub mod config;
pub mod models;
pub mod publisher;
pub mod routes;
pub mod source;
pub mod store;
pub mod version;
pub mod worker;
