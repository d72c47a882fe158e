pub mod annotations;
pub mod api_token;
pub mod auth;
pub mod dataset;
pub mod documents;
pub mod error;
pub mod health;
pub mod labels;
pub mod permissions;
pub mod projects;
pub mod routes;
pub mod state;
pub mod stats;
pub mod users;
pub mod utils;
