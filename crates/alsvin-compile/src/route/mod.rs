//! Routing: basis decomposition, layouts, and SWAP insertion.

mod decompose;
mod layout;
mod sabre;

pub use decompose::{BasisGates, decompose_to_basis};
pub use layout::Layout;
pub use sabre::{RouterOptions, RoutingResult, route};
