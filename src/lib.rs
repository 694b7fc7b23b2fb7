pub mod commands;
pub mod excel;
pub mod profile;
pub mod split;
pub mod storage;

pub use commands::{AppState, CommandError, SplitRequest};
pub use profile::{Parameter, Profile};
pub use split::{classify_and_split, discover_columns, SplitError, SplitManifest, SplitOptions};
pub use storage::{JsonFileStorage, MemoryStorage, Storage};
