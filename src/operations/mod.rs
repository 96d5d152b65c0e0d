//! Operations: the derivation engine and its write path

pub mod derivation;
