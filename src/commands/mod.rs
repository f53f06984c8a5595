mod moderation;
mod podcasts;
mod social;

pub use moderation::*;
pub use podcasts::*;
pub use social::*;
