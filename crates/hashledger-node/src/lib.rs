//! HTTP front end for in-memory hashledger chains.

pub mod constants;
pub mod error;
pub mod routes;
pub mod settings;
pub mod state;

pub use routes::router;
pub use state::AppState;
