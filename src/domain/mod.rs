pub mod artifact;
pub mod post;
pub mod run;
pub mod target;

pub use artifact::{ArtifactKind, ScreenshotArtifact};
pub use post::{digest, Counter, Engagement, PostRecord};
pub use run::RunRecord;
pub use target::{canonical_permalink, post_id, validate_query, CaptureMode, Origin, Target};
