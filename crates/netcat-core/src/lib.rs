pub mod change_detector;
pub mod codec;
pub mod config;
pub mod device;
pub mod error;
pub mod fleet_runner;
pub mod logging;
pub mod output_format;
pub mod prompt_expecter;
pub mod selectors;
pub mod semaphore;
pub mod session;
pub mod settings;
pub mod snapshot_builder;
pub mod util;
pub mod vendors;

#[macro_use]
extern crate lazy_static;

pub use change_detector::{detect_config_change, ChangeResult};
pub use codec::{compress_output, decode_command, decompress_output, encode_command};
pub use config::{NetcatConfig, NetcatConfigBuilder};
pub use device::{AuthMode, DeviceDescriptor, DeviceType};
pub use error::NetcatError;
pub use fleet_runner::{run_fleet, FleetResult};
pub use logging::init_logging;
pub use output_format::{CompressedSnapshot, DeviceOutcome, DeviceSnapshot, JobStatus, OutputFormat};
pub use selectors::{resolve as resolve_selector, InventoryEntry, Selector};
pub use semaphore::{SemaphoreError, SemaphorePermit, TimeoutSemaphore};
pub use session::{CliSession, SessionState};
pub use snapshot_builder::build_snapshot;
pub use vendors::{
    cisco::CiscoAdapter, f5::F5Adapter, paloalto::PaloAltoAdapter, CreateSnapshot, DeploySnippet,
    PaloAltoOps, SiteIdentityOps, VendorAdapter,
};
