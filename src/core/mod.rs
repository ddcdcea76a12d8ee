pub mod confidence;
pub mod model;
pub mod nic;
pub mod transcript;
