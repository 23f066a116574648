//! Configuration access port trait.

use std::collections::BTreeMap;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;

    /// Every key/value pair of `section`, or `None` if the section is absent.
    /// Keys without a value map to an empty string.
    fn section_entries(&self, section: &str) -> Option<BTreeMap<String, String>>;
}
