// Pure functions over the models - no I/O, no clock reads

pub mod filter;
pub mod status;
pub mod text;
pub mod validation;

pub use filter::{Criterion, Filter, Kind, SearchHit, Searchable};
pub use status::EventStatus;
pub use text::{initials, time_ago};
pub use validation::{NewPost, ValidationError};
