//! Built-in signal processors

mod behavior;
mod device;
mod location;
mod network;
mod resource;
mod time;

pub use behavior::BehaviorProcessor;
pub use device::DeviceProcessor;
pub use location::{haversine_km, LocationProcessor, IMPOSSIBLE_TRAVEL_KMH};
pub use network::NetworkProcessor;
pub use resource::ResourceProcessor;
pub use time::TimeProcessor;
