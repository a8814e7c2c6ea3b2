pub mod classifier;
pub mod compare;
pub mod consolidator;
pub mod drift;
pub mod embedder;
pub mod extractor;
pub mod profile;
pub mod relations;
pub mod topics;

pub use classifier::ClaimClassifier;
pub use compare::AuthorComparator;
pub use consolidator::BeliefConsolidator;
pub use drift::DriftDetector;
pub use embedder::ClaimEmbedder;
pub use extractor::ClaimExtractor;
pub use profile::ProfileBuilder;
pub use relations::RelationBuilder;
pub use topics::{DomainProjector, TopicNormalizer};
