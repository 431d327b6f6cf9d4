//! Road-quality analysis of a recorded trip.
//!
//! This module detects bumps in the vertical acceleration, splits the route
//! into fixed-length segments, colors each segment by smoothness, rates the
//! whole trip, and drives the collaborators that publish the results.

pub mod analyzer;
pub mod bumps;
pub mod grade;
pub mod score;
pub mod segments;
pub mod types;
pub mod utility;
