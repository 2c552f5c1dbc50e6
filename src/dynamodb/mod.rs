pub mod create_table;
pub mod debug;
pub mod flatten;
pub mod keys;
pub mod mutate;
pub mod source;

pub use create_table::*;
pub use debug::{format_sdk_error, send_dynamo_request};
pub use flatten::*;
pub use keys::*;
pub use mutate::*;
pub use source::*;
