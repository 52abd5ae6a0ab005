pub mod connectivity;
pub mod db;
pub mod error;
pub mod grouping;
pub mod lms;
pub mod models;
pub mod routing;
pub mod services;
