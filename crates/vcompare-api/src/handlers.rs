//! Request handlers.

pub mod compare;
pub mod health;
pub mod index;
pub mod outputs;

pub use compare::*;
pub use health::*;
pub use index::*;
pub use outputs::*;
