pub mod animate;
pub mod backend;
pub mod events;
pub mod persistence;
pub mod pipeline;
pub mod reconcile;
pub mod transform;
pub mod types;
