//! Unit tests for the ecoroute CLI commands.

mod helpers;
mod import_unit;
