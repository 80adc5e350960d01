//! Time-dependent transit router.
//!
//! Builds a graph from a GTFS feed's stops and stop times, where transport
//! edges carry timetables and pedestrian edges join nearby stops, and answers
//! earliest-arrival queries over it.

pub mod cache;
pub mod domain;
pub mod feed;
pub mod geo;
pub mod graph;
pub mod router;
pub mod walkable;
pub mod web;
