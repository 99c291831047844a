pub mod clipboard;
#[cfg(test)]
pub mod test_utils;
pub mod url;
