//! Remote catalog boundary: the client contract the reconcilers consume,
//! its error taxonomy, and the GraphQL implementation.

mod client;
mod error;
mod graphql;
mod remote;

pub use client::{CatalogClient, CatalogResult, CriteriaDiff, RemoteComponent, RemoteScorecard};
pub use error::CatalogError;
pub use remote::CompassClient;
