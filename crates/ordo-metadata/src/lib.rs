pub mod core;
pub mod store;
pub mod client;
pub mod memory;
pub mod podgroup;

pub use crate::core::{Spec, Status, ObjectMeta, OwnerSet};
pub use crate::store::MetadataStoreObject;
pub use crate::client::{ClientError, MetadataClient, SharedClient};
