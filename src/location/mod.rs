//! Location subsystem for Lanka Route.
//!
//! Reference data (cities, districts) is loaded once into a sealed
//! [`ReferenceStore`]; place-name tokens are then resolved against it by the
//! [`LocationResolver`] matching chain.

pub mod cache;
pub mod normalize;
pub mod providers;
pub mod resolver;
pub mod sql;
pub mod store;
pub mod types;

pub use normalize::normalize;
pub use providers::{city_list, fallback_store, CityInfo, ReferenceLoader};
pub use resolver::{split_token, LocationResolver};
pub use store::{ReferenceStore, StoreBuilder, StoreStats};
pub use types::{
    CityRecord, CityRow, Coordinate, DataSource, DistrictRecord, DistrictRow, LocationError,
    MatchStrategy, ResolvedCity,
};
