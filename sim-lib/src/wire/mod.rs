//! Line protocol spoken with clients.
//!
//! A request is a single line, `<file_path>` or `<elapsed_ms>,<file_path>`.
//! A response is `<status_code>,<bytes_read>,<total_elapsed_ms>,<file_path>`
//! without terminator, the connection close marks its end.

mod request;
mod response;

pub use self::{
    request::{FIELD_DELIMITER, MAX_OVERRIDE_DIGITS, ParseOutcome, Request},
    response::{ReadResponse, ResponseParseError},
};
