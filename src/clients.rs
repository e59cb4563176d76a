pub mod changelog;
pub mod releases;

pub use changelog::ChangelogClient;
pub use releases::ReleasesClient;
