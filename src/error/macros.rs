//! Constructor generation for error variants
//!
//! Each constructor takes every field as `impl Into<String>`, so call sites
//! can pass `&str`, `String` or a `Display` result alike.

/// Generate `pub fn` constructors for string-field variants of
/// [`ProvisionError`](super::ProvisionError)
///
/// ```rust,ignore
/// impl_error_constructors! {
///     /// Creates a file not found error
///     not_found => FileNotFound { path },
/// }
/// ```
macro_rules! impl_error_constructors {
    ($( $(#[$meta:meta])* $name:ident => $variant:ident { $($field:ident),+ $(,)? } ),* $(,)?) => {
        $(
            $(#[$meta])*
            pub fn $name($($field: impl Into<String>),+) -> $crate::error::ProvisionError {
                $crate::error::ProvisionError::$variant {
                    $($field: $field.into()),+
                }
            }
        )*
    };
}

pub(crate) use impl_error_constructors;

#[cfg(test)]
mod tests {
    use crate::error::ProvisionError;

    mod generated {
        use crate::error::impl_error_constructors;

        impl_error_constructors! {
            spawn => CommandFailed { command, reason },
            missing => FileNotFound { path },
        }
    }

    #[test]
    fn test_generated_constructors_fill_every_field() {
        let err = generated::spawn("aqt list-qt", String::from("not found"));
        assert!(matches!(
            err,
            ProvisionError::CommandFailed { ref command, ref reason }
                if command == "aqt list-qt" && reason == "not found"
        ));
        assert!(matches!(
            generated::missing("CMakeLists.txt"),
            ProvisionError::FileNotFound { ref path } if path == "CMakeLists.txt"
        ));
    }
}
