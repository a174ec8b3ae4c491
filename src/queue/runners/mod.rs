mod local;
mod simulated;

pub use local::{LocalParameters, LocalRunner};
pub use simulated::{SimulatedParameters, SimulatedRunner};
