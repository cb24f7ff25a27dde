//! Integration tests for the crawl job service
//!
//! These tests use wiremock to stand in for the listing page and its data
//! endpoint, and an instrumented in-process session factory for the browser
//! strategy.

mod api_tests;
mod common;
mod network_tests;
