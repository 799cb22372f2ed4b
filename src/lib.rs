pub mod android_jni;
pub mod banner;
pub mod camera;
pub mod config;
pub mod debounce;
pub mod directions;
pub mod distance;
pub mod instructions;
pub mod maneuver;
pub mod nav;
pub mod polyline;
pub mod recents;
pub mod reroute;
pub mod route;
pub mod state_machine;
pub mod trip;
pub mod voice;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
