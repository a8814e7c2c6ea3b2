mod authors;
mod beliefs;
mod claims;
mod profiles;
mod relations;
mod timeline;

pub use authors::AuthorRepository;
pub use beliefs::BeliefRepository;
pub use claims::ClaimRepository;
pub use profiles::ProfileRepository;
pub use relations::RelationRepository;
pub use timeline::TimelineRepository;
