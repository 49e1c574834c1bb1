//! Instantiation units generated by `build.rs` from `instances.manifest`
//!
//! Each unit is its own module holding at most `max.instances` concrete
//! routines and a `register` function; [`UNITS`] lists them all.

include!(concat!(env!("OUT_DIR"), "/instances.rs"));
