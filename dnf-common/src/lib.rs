//! Shared traits and the crate-wide error taxonomy used by every dnf-core component.

mod error;
mod traits;

pub use error::{Error, ModuleErrorKind};
pub use traits::{
    Arched, GenericPackageMetadata, HasConflicts, HasObsoletes, HasProvides, HasRequires,
    HasWeakDependencies, Installed, Named, Versioned,
};

fluent_i18n::i18n!("locales");
