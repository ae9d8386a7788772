pub mod cascade;
pub mod coincidence;
pub mod config;

pub use cascade::{Category, CategoryCounts, Classification, Classifier};
pub use coincidence::BeamCoincidenceCounter;
pub use config::ClassifierConfig;
