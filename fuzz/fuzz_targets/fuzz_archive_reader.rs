//! Fuzz target for upload archive reading.
//!
//! Archives are inspected before upload and may have been damaged on disk,
//! so opening one must return an error rather than panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use ra_archive::ArchiveReader;

fuzz_target!(|data: &[u8]| {
    // Most random input fails at the ZIP directory; anything that opens gets fully verified.
    if let Ok(mut reader) = ArchiveReader::from_bytes(data.to_vec()) {
        let _ = reader.verify_all();
        let _ = reader.read_answers();
    }
});
