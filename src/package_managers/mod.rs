//! Package manager backends

mod apt;
pub mod deb_archive;
pub mod dpkg_status;
mod mock;
mod traits;

pub use apt::{AptBackend, classify_failure};
pub use mock::{MockBackend, MockState};
pub use traits::PackageBackend;

use crate::config::Settings;
use crate::core::paths;

/// Pick the backend for this invocation.
///
/// `APT_PLUGIN_TEST_MODE=1` swaps apt for the file-backed mock so the CLI can
/// be exercised without root or a Debian system.
pub fn select_backend(settings: &Settings) -> Box<dyn PackageBackend> {
    if paths::test_mode() {
        tracing::debug!("Test mode: using mock backend");
        Box::new(MockBackend::from_data_dir())
    } else {
        Box::new(AptBackend::new(settings.apt.clone()))
    }
}
