//! The modularity state machine: defaults reconciliation, active-module
//! resolution, and the RPM-level visibility filter it produces for the sack
//! (§4.2).

mod container;
mod document;
mod metadata;
mod state;

pub use container::{ModuleContainer, ModuleProblem, RpmFilterPlan};
pub use document::{ModuleDefaults, ModuleDocument};
pub use metadata::{InMemoryModuleMetadataSource, ModuleMetadataSource};
pub use state::{read_state_dir, ModuleRecord, ModuleState};
