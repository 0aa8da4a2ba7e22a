//! The handful of configuration knobs the core itself reads (§1:
//! "Configuration file parsing beyond what the core reads" is out of
//! scope — there is no INI/TOML parser here, only the typed surface a
//! caller who *did* parse a config file would populate).

use std::path::PathBuf;

/// Configuration the core consults directly, as opposed to the much larger
/// set of `dnf.conf` options a CLI wrapper would parse and never pass down.
#[derive(Clone, Debug)]
pub struct Config {
    /// Where downloaded package files and solv-caches are written.
    pub cachedir: PathBuf,
    /// The filesystem root a transaction installs into and a sack's system
    /// repo is read from.
    pub installroot: PathBuf,
    /// How many versions of an installonly package (e.g. a kernel) are kept
    /// installed in parallel.
    pub installonly_limit: u32,
    /// Whether the running kernel (and its modules package, if present) is
    /// protected from removal regardless of an explicit erase request.
    pub protect_running_kernel: bool,
    /// Whether a repository is required to carry `gpgcheck` by default.
    pub gpgcheck: bool,
    /// Whether every planned install must verify against the trusted
    /// keyring, even for a repo with `gpgcheck` disabled.
    pub only_trusted: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            cachedir: PathBuf::from("/var/cache/dnf"),
            installroot: PathBuf::from("/"),
            installonly_limit: 3,
            protect_running_kernel: true,
            gpgcheck: true,
            only_trusted: false,
        }
    }
}
