pub mod cache;
pub mod config;
pub mod error;
pub mod identity;
pub mod models;
pub mod repository;
pub mod state;
pub mod store;
pub mod subscription;
pub mod tmdb;
pub mod usecase;
