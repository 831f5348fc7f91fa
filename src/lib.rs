//! Quiz-chain solver library.
//!
//! Renders web-hosted quiz pages in headless Chromium, extracts a candidate
//! answer through an ordered heuristic chain, POSTs it to the submit endpoint
//! discovered on the page, and follows the `url` field of the response until
//! the wall-clock budget runs out or the server stops supplying pages.

pub mod config;
pub mod extract;
pub mod fetch;
pub mod renderer;
pub mod server;
pub mod session;
