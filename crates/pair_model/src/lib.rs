//! Pure pair model: state, formulas and transitions of a constant-product pair
//! No I/O, no unwrap/panic, all functions total

pub mod error;
pub mod state;
pub mod math;
pub mod helpers;
pub mod transitions;
pub mod quote;

// Re-export commonly used types
pub use error::*;
pub use state::*;
pub use math::*;
pub use helpers::*;
pub use transitions::*;
pub use quote::*;
