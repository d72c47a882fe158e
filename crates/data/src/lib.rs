pub mod annotation;
pub mod api_token;
pub mod dataset;
pub mod document;
pub mod label;
pub mod project;
pub mod stats;
pub mod user;
