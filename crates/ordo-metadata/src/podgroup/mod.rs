mod spec;
mod status;
mod replica;

pub use self::spec::*;
pub use self::status::*;
pub use self::replica::*;
