pub mod config;
pub mod controller;
pub mod event;
pub mod sway;
pub mod transform;

pub use config::{ConfigurationError, SessionConfig};
pub use controller::{SessionError, SessionState, TrialController};
pub use event::SessionEvent;
pub use sway::SwayState;
pub use transform::{transform_input, TransformedInput};
