pub mod api;
pub mod auth;
pub mod carnet;
pub mod domain;
pub mod jwt;
