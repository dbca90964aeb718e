pub mod exclusion;
pub mod walk;

pub use exclusion::{ExclusionRule, ExclusionSet, OS_ARTIFACTS};
pub use walk::{ScanOutput, ScannedFile, TreeScanner};
