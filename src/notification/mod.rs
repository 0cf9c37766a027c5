pub mod parser;
pub mod types;

pub use parser::{action_to_check, parse_event, parse_event_str};
pub use types::*;
