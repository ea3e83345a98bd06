//! Shared helpers for integration tests.

#![allow(dead_code)]

pub mod bit_writer;
pub mod png_builder;
