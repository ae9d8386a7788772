pub mod loader;
pub mod record;

pub use loader::{parse_candidates, read_candidates};
pub use record::{BeamMask, Candidate, MAX_BEAMS};
