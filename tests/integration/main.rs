//! Integration tests for Site-Distiller
//!
//! Both the crawled site and the transformation endpoint are wiremock
//! servers; output goes to temporary directories.

mod pipeline_tests;
