pub mod space;
pub mod parameters;
pub mod targets;
pub mod measurement;
pub mod errors;

pub use space::*;
pub use parameters::*;
pub use targets::*;
pub use measurement::*;
pub use errors::*;
