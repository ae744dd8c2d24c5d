//! Lanka Route — resolve Sri Lankan place names and plot them.
//!
//! ```no_run
//! use lanka_route::location::fallback_store;
//! use lanka_route::plot::PlotPlan;
//! use lanka_route::location::LocationResolver;
//!
//! let store = fallback_store();
//! let plan = PlotPlan::from_fragment(&LocationResolver::new(&store), "start;Colombo&end;Kandy");
//! assert_eq!(plan.markers.len(), 2);
//! ```

pub mod config;
pub mod location;
pub mod plot;
pub mod server;
