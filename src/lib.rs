pub mod config;
pub mod contracts;
pub mod db;
pub mod health;
pub mod repos;
pub mod routes;
pub mod services;
pub mod tenant;
pub mod validation;
