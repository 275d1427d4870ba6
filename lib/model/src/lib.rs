mod format;
mod results;
mod source;
mod store;

pub use format::*;
pub use results::*;
pub use source::*;
pub use store::*;
