//! Low-level helpers for reading the zip container and XML parts of xlsx files
pub(crate) mod xml;
pub(crate) mod zip;
