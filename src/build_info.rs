//! Compile-time build information.
//!
//! `BUILD_COMMIT` is stamped into exported diagnosis documents (the `build`
//! field of `DiagnosisRecord::export_json`) so an exported record can be
//! traced back to the engine revision that produced it.

include!(concat!(env!("OUT_DIR"), "/build_info.rs"));
