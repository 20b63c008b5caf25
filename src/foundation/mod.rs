pub(crate) mod alloc_track;
pub(crate) mod error;
pub(crate) mod fingerprint;
