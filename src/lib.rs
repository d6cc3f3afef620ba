pub mod api_router;
pub mod auth;
pub mod bootstrap;
pub mod catalog;
pub mod clients;
pub mod dashboard;
pub mod projects;
pub mod quotations;
pub mod shared;
