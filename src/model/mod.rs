pub mod common;
pub mod feedback;
pub mod payload;
pub mod report;
pub mod screen;

pub use common::*;
pub use feedback::*;
pub use payload::*;
pub use report::*;
pub use screen::*;
