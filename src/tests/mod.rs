//! # Cross-Module Test Suite
//!
//! Unit tests live next to the code they cover. The tests here drive the
//! whole pipeline: photo selection, rendering, packing and the transfer
//! sequence against an in-memory panel.
