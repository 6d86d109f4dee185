//! Transport backends

mod reqwest_backend;
