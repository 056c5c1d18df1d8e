//! Clients for the external authentication and balance-lookup endpoints.

pub mod auth;
pub mod lookup;

pub use auth::{AuthClient, Credentials};
pub use lookup::{BalanceLookup, HttpLookupClient, LookupReply};
