//! Integration tests for the M2 codec

mod common;
mod conversion;
mod external_files;
mod roundtrip;
