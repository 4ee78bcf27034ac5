//! capstan-inventory — inventory client seam for the capstan engine.
//!
//! Defines the [`InventoryClient`] trait the producers consume, the
//! [`DeadlineClient`] decorator that bounds reads with a timeout, and a
//! [`StaticInventory`] snapshot store for demos and tests. The real
//! inventory service lives outside this repository.

pub mod client;
pub mod static_inventory;

pub use client::{DeadlineClient, InventoryClient, InventoryError, InventoryResult};
pub use static_inventory::{InventoryFixture, StaticInventory};
