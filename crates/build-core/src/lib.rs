pub mod crds;
pub mod determiners;
pub mod implementations;
pub mod models;
pub mod registry;
