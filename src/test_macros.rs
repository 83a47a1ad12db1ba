//! Test macros for the NonZero configuration newtypes

/// Generate standard tests for a NonZero newtype wrapper
///
/// # Arguments
/// * `$type_name` - The newtype struct name (e.g., `MaxActive`)
/// * `$default_value` - Expected value of the DEFAULT constant
/// * `$test_value` - A valid non-zero value different from the default
///
/// # Example
/// ```ignore
/// test_nonzero_newtype!(MaxActive, 100, 16);
/// ```
#[macro_export]
macro_rules! test_nonzero_newtype {
    ($type_name:ident, $default_value:expr, $test_value:expr) => {
        #[test]
        fn test_default() {
            assert_eq!($type_name::DEFAULT.get(), $default_value);
            assert_eq!($type_name::default(), $type_name::DEFAULT);
        }

        #[test]
        fn test_new_valid() {
            let value = $type_name::new($test_value).unwrap();
            assert_eq!(value.get(), $test_value);
            assert_eq!(value.to_string(), $test_value.to_string());
        }

        #[test]
        fn test_new_zero_rejected() {
            assert!($type_name::new(0).is_none());
        }

        #[test]
        fn test_serde_round_trip() {
            let value = $type_name::new($test_value).unwrap();
            let json = serde_json::to_string(&value).unwrap();
            assert_eq!(json, $test_value.to_string());
            assert_eq!(serde_json::from_str::<$type_name>(&json).unwrap(), value);
            assert!(serde_json::from_str::<$type_name>("0").is_err());
        }
    };
}

/// Generate FromStr tests for a newtype
///
/// # Example
/// ```ignore
/// test_newtype_from_str!(MaxActive, "32", 32, "lots");
/// ```
#[macro_export]
macro_rules! test_newtype_from_str {
    ($type_name:ident, $valid_str:expr, $expected_value:expr, $invalid_str:expr) => {
        #[test]
        fn test_from_str_valid() {
            let value: $type_name = $valid_str.parse().unwrap();
            assert_eq!(value.get(), $expected_value);
        }

        #[test]
        fn test_from_str_invalid() {
            assert!($invalid_str.parse::<$type_name>().is_err());
            assert!("0".parse::<$type_name>().is_err());
        }
    };
}
