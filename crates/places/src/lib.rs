//! HTTP adapters for the places provider and the Business Profile listing API.

pub mod client;
pub mod profile;
pub mod wire;

pub use client::{PlacesClient, PlacesError};
pub use profile::{BusinessProfileClient, ProfileAccount, ProfileLocation};
