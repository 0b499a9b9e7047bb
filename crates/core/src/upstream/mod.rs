mod error;
mod traits;
mod types;

pub use error::{FetchError, MappingError};
pub use traits::{Mapper, UpstreamClient};
pub use types::RawRecord;
