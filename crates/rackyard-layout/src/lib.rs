//! Floor records and automatic rack placement for warehouse layouts.

pub mod error;
pub mod floor;
pub mod rack;

pub use error::LayoutError;
pub use floor::{FloorId, FloorRecord, FloorRegistry};
pub use rack::{Clearance, MAX_LEVELS, RackFootprint, RackPlan, RackSpec, place_racks, place_racks_on_floor, plan_racks};
