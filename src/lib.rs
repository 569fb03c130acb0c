//! Core library exports for the Localserve marketplace.
//!
//! This crate exposes the domain, persistence, service and HTTP layers of a
//! multi-tenant local-services booking application. The `data` feature builds
//! only the reusable domain/persistence layer; the default `server` feature
//! builds the full Actix-web application.

#[cfg(feature = "server")]
pub mod auth;
#[cfg(feature = "data")]
pub mod db;
#[cfg(feature = "data")]
pub mod domain;
#[cfg(feature = "server")]
pub mod dto;
#[cfg(feature = "server")]
pub mod forms;
#[cfg(feature = "server")]
pub mod media;
#[cfg(feature = "data")]
pub mod models;
#[cfg(feature = "server")]
pub mod notify;
#[cfg(feature = "data")]
pub mod pagination;
#[cfg(feature = "data")]
pub mod repository;
#[cfg(feature = "server")]
pub mod routes;
#[cfg(feature = "data")]
pub mod schema;
#[cfg(feature = "server")]
pub mod services;
