//! Guesty Open API proxy.
//!
//! Every call exchanges the client credentials for a fresh bearer token and
//! forwards one read to the Open API.

pub mod client;

pub use client::{GuestyClient, GuestyResource};
