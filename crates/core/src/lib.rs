#![forbid(unsafe_code)]

pub mod eligibility;
pub mod id_gen;
pub mod model;
pub mod time;

pub use id_gen::IdGenerator;
pub use time::Clock;
