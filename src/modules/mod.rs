//! Biological data modules

pub mod io;
pub mod seq;
