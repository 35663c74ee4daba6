//! CropCheck Advisory
//!
//! Turns ranked classifier labels into an agronomic recommendation.
//!
//! Reference data is YAML compiled into the crate (or loaded from override
//! files) and specifies:
//! - Alias spellings of canonical disease keys
//! - Curated disease records (description, symptoms, treatment)
//! - Pesticide rules (product, dosage, spray water, price)
//!
//! Everything here is pure over immutable tables, so a single
//! [`Catalog`] can be shared across request handlers behind an `Arc`.

pub mod assembler;
pub mod catalog;
pub mod knowledge;
pub mod pesticide;

pub use assembler::{assemble, ResolvedPrediction};
pub use catalog::{Advisor, Catalog, CatalogPaths, DiseaseView, DosageRequest};
pub use knowledge::KnowledgeBase;
pub use pesticide::{estimate, PesticideTable};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::catalog::{Advisor, Catalog, DosageRequest};
    pub use crate::knowledge::KnowledgeBase;
    pub use crate::pesticide::PesticideTable;
}
