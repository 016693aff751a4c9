pub mod amount;
pub use amount::*;
pub mod escrow;
pub use escrow::*;
