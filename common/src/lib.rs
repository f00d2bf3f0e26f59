//! AMMSim Common Types
//!
//! Shared types used across the AMMSim crates: the token registry, token
//! pairs and sides, and the decimal amount parsing and display policy.

pub mod amount;
pub mod error;
pub mod pair;
pub mod token;

pub use amount::*;
pub use error::*;
pub use pair::*;
pub use token::*;
