//! Safe SQL builder: identifiers quoted from introspection, values as parameters.

mod builder;
pub mod params;
pub use builder::*;
pub use params::*;
