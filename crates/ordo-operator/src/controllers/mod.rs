pub mod podgroup;
pub mod shared;
