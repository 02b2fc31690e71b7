//! Domain-specific assertion macros for logmunch harnesses.
//!
//! These add context-rich failure messages that make it clear which record
//! and which key tripped the assertion.

/// Assert that a `Record` has `key` set to `value`.
///
/// ```rust,ignore
/// assert_entry!(record, "status", "200");
/// ```
#[macro_export]
macro_rules! assert_entry {
    ($record:expr, $key:expr, $value:expr) => {{
        let record: &logmunch_core::Record = &$record;
        let key: &str = $key;
        let expected: &str = $value;
        match record.get(key) {
            Some(actual) if actual == expected => {}
            Some(actual) => panic!(
                "assert_entry! failed:\n  record.entries[{:?}]\n  expected: {:?}\n  actual:   {:?}\n  record:   {}",
                key, expected, actual, record
            ),
            None => panic!(
                "assert_entry! failed: key {:?} not found.\n  Available keys: {:?}",
                key,
                record.entries.keys().collect::<Vec<_>>()
            ),
        }
    }};
}

/// Assert that a `Record` does not carry `key`.
#[macro_export]
macro_rules! assert_no_entry {
    ($record:expr, $key:expr) => {{
        let record: &logmunch_core::Record = &$record;
        let key: &str = $key;
        if let Some(value) = record.get(key) {
            panic!(
                "assert_no_entry! failed: key {:?} is present with value {:?}\n  record: {}",
                key, value, record
            );
        }
    }};
}

/// Assert that a `Record` has the expected name.
#[macro_export]
macro_rules! assert_name {
    ($record:expr, $name:expr) => {{
        let record: &logmunch_core::Record = &$record;
        let expected: &str = $name;
        if record.name != expected {
            panic!(
                "assert_name! failed:\n  expected: {:?}\n  actual:   {:?}\n  record:   {}",
                expected, record.name, record
            );
        }
    }};
}
