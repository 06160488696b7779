pub mod builders;
pub mod draft;
pub mod group_edit;
pub mod normalize;
pub mod orchestrator;
pub mod session;

pub use builders::*;
pub use draft::*;
pub use group_edit::*;
pub use normalize::*;
pub use orchestrator::*;
pub use session::*;
