pub mod grid;
pub mod mapping;
pub mod series;

pub use grid::*;
pub use mapping::*;
pub use series::*;
