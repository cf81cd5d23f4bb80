pub mod market;
pub mod outcome;
pub mod position;
pub mod strategy;
pub mod token;
pub mod transaction;

pub use market::*;
pub use outcome::*;
pub use position::*;
pub use strategy::*;
pub use token::*;
pub use transaction::*;
