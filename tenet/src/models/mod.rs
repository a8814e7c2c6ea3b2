mod analysis;
mod author;
mod belief;
mod claim;
mod profile;

pub use analysis::*;
pub use author::*;
pub use belief::*;
pub use claim::*;
pub use profile::*;
