//! Lojista Pro assistant core: natural-language order creation for a repair shop.
//!
//! Turns free-text chat commands into service orders: the text goes to an
//! external language model (`inference`), the structured reply is reconciled
//! against the technician directory (`directory`, `reconcile`), and the
//! resulting order is committed through the persistence contracts (`store`).
//! `session` drives one chat conversation end to end.

pub mod config;
pub mod currency;
pub mod db;
pub mod directory;
pub mod error;
pub mod health;
pub mod inference;
pub mod orders;
pub mod reconcile;
pub mod reports;
pub mod roster;
pub mod session;
pub mod settings;
pub mod state;
pub mod store;
pub mod telemetry;
