//! Integration tests for Feed-Tide
//!
//! These tests use wiremock to serve blogs, feeds, sitemaps and robots files
//! and drive the pipeline end-to-end against them.

mod common;
mod feed_tests;
mod sitemap_tests;
mod sync_tests;
