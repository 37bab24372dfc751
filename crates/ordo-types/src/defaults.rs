use std::time::Duration;

pub const DEFAULT_NAMESPACE: &str = "default";

// owner set compare-and-swap
pub const OWNER_UPDATE_MAX_ATTEMPTS: u32 = 5;
pub const OWNER_UPDATE_BACKOFF_MIN_DURATION: Duration = Duration::from_millis(10);
pub const OWNER_UPDATE_BACKOFF_MAX_DURATION: Duration = Duration::from_secs(1);
pub const OWNER_UPDATE_BACKOFF_FACTOR: f64 = 2.0;

// replica annotations
pub const DECOMMISSION_ANNOTATION: &str = "ordo.io/decommission";
pub const DECOMMISSION_REQUESTED: &str = "requested";

// labels
pub const GROUP_LABEL: &str = "ordo.io/pod-group";

// remote storage listing
pub const STORAGE_LIST_MAX_KEYS: usize = 4000;
pub const STORAGE_LIST_DELIMITER: &str = "/";
