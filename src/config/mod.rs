pub mod profile;
pub mod settings;

pub use profile::CompressionProfile;
pub use settings::Settings;
