pub mod adb;
pub mod text_input;
pub mod traits;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;
