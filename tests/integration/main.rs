//! Integration tests for the attraction harvester

mod harvest_tests;
