//! Core logic – the async loader and the things it loads.
//!
//! Nothing in here draws to the terminal.  [`loader`] is generic over its
//! request/payload/output types; [`pages`] and [`graphql`] provide the two
//! operations the app plugs into it.

pub mod graphql;
pub mod loader;
pub mod pages;
