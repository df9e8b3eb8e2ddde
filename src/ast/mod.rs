pub mod expr;
pub mod literal;
pub mod order;

pub use expr::*;
pub use literal::*;
pub use order::*;
