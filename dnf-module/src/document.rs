//! Module package documents and distro-supplied defaults.
//!
//! Parsing the real modulemd YAML format is out of scope; callers supply
//! already-parsed [`ModuleDocument`]s/[`ModuleDefaults`] through a
//! [`crate::ModuleMetadataSource`], the same narrow-adapter shape
//! `dnf_sack::RepoMetadataSource` uses for `primary.xml`.

use std::collections::HashMap;

/// A single harvested modulemd document: one (name, stream, version, context,
/// arch) build, per §3's `ModulePackage`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ModuleDocument {
    /// The module name.
    pub name: String,
    /// The stream this document belongs to.
    pub stream: String,
    /// The module build version.
    pub version: u64,
    /// The module build context (a short content hash).
    pub context: String,
    /// The module's architecture.
    pub arch: String,
    /// NEVRA strings of the RPMs this module build provides.
    pub artifacts: Vec<String>,
    /// Named profiles: profile name → RPM names in that profile.
    pub profiles: HashMap<String, Vec<String>>,
    /// Profiles installed by default when the module is enabled without an
    /// explicit profile choice.
    pub default_profiles: Vec<String>,
    /// Module-to-module dependencies: `(required module name, required stream)`.
    pub requires: Vec<(String, String)>,
    /// Which repository this document was harvested from.
    pub reponame: String,
}

/// A distro-supplied default stream (and optionally default profiles) for a
/// module name.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ModuleDefaults {
    /// The module name these defaults apply to.
    pub name: String,
    /// The default stream, if the distro declares one.
    pub stream: Option<String>,
    /// Profiles installed by default on the default stream.
    pub profiles: Vec<String>,
}
