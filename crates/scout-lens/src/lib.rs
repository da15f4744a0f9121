//! Lens Contract loader & validator (spec section 4.2). A lens is the
//! single external document that carries every vertical-specific piece
//! of semantics; everything downstream of this crate treats it as
//! opaque, validated data — never as code.

pub mod contract;
pub mod error;
pub mod hash;
pub mod loader;
pub mod validate;

#[cfg(any(test, feature = "test-support"))]
pub mod fixtures;

pub use contract::{
    Applicability, CanonicalValues, ConnectorRule, FieldCondition, FieldExtractor, FieldRule,
    LensContract, MappingRule, ModuleDef, ModuleTrigger, Trigger, Vocabulary, WhenClause,
};
pub use error::LensValidationError;
pub use loader::load;
