//! Configuration errors

use super::impl_error_constructors;

impl_error_constructors! {
    parse_failed => ConfigParseFailed { path, reason },
    read_failed => ConfigReadFailed { path, reason },
}
