pub mod api;
pub mod enums;
pub mod error;
pub mod ids;
pub mod model;
pub mod ownership;
pub mod time;
pub mod validate;

pub use api::*;
pub use enums::{ChainType, EnumerationKind, LtrType, MotifType};
pub use error::{HervError, HervResult};
pub use ids::*;
pub use model::*;
pub use ownership::{Entity, OWNERSHIP, OnOwnerDelete, OwnershipEdge};
pub use time::*;
pub use validate::TextLimits;
