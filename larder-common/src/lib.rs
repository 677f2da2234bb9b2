//! # Larder Common Library
//!
//! Shared code for the larder web server and command-line tool:
//! - Ingredient model and derived expiry fields
//! - Pipe-delimited record files with locked, atomic rewrites
//! - Pantry read-modify-write operations
//! - Shopping list derivation and the home-page overview
//! - Account storage (SQLite)
//! - Configuration loading

pub mod config;
pub mod db;
pub mod error;
pub mod html;
pub mod model;
pub mod overview;
pub mod pantry;
pub mod shopping;
pub mod store;
pub mod time;

pub use error::{Error, Result};
pub use model::{Ingredient, NewIngredient};
pub use pantry::Pantry;
pub use shopping::{Priority, ShoppingItem, ShoppingKind};
