//! Client-side reader for escrow accounts.
//!
//! Decodes the fixed-layout escrow record and scans a seller's escrows for the
//! ones whose refund deadline has passed and whose balance still covers the
//! recorded amount.

pub mod clock;
pub mod config;
pub mod error;
pub mod scanner;
pub mod session;
pub mod source;
pub mod state;

pub use clock::*;
pub use config::*;
pub use error::*;
pub use scanner::*;
pub use session::*;
pub use source::*;
pub use state::*;
