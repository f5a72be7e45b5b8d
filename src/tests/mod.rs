

#[cfg(feature = "allow_filesystem")]
mod export_test;
