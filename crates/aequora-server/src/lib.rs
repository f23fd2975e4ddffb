// Aequora community services HTTP server
// Wires configuration, logging, authentication and the route table

pub mod api; // HTTP handlers and the route table
pub mod error; // HTTP error mapping
pub mod middleware; // Token extraction middleware
pub mod model; // Configuration, shared state and response envelope
pub mod secured; // Role checks for handlers
pub mod startup; // Logging, server and shutdown wiring

pub use secured::{Secured, SecuredBuilder};
