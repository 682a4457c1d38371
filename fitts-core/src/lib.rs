pub mod geometry;
pub mod observation;
pub mod profile;
pub mod report;
pub mod target;

pub use geometry::{Point, Surface};
pub use observation::{ObservationError, TrialDataset, TrialObservation};
pub use profile::{ImpairmentLevel, ImpairmentProfile, ProfileError};
pub use report::SessionReport;
pub use target::TargetSpec;
