mod engine;
mod error;
mod functions;
mod source;
pub mod test_util;

pub use engine::*;
pub use error::*;
pub use functions::*;
pub use source::*;
