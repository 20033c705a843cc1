//! crossval — held-out prediction error of fitted rates.
//!
//! - [`partition`]: by-family folds and leave-one-species-out splits, and
//!   their scratch files.
//! - [`validate`]: the refit / reconstruct / compare cycles and their report,
//!   and scoring of a user-written validation file.
//! - [`errors`]: [`CvError`].

pub mod errors;
pub mod partition;
pub mod validate;

pub use self::errors::{CvError, CvResult};
pub use self::partition::{FamilyFold, family_folds};
pub use self::validate::{
    CvReport, FoldError, cross_validate_by_family, cross_validate_by_species, validate_species_file,
};
