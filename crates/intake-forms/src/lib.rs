//! # intake-forms
//!
//! State and validation for the person intake form. Provides the field
//! definitions, the value store, the synchronous rule engine, the
//! asynchronous email validator, the submit gate, and the submission
//! handler, all tied together by [`PersonForm`](form::PersonForm).
//!
//! The email validator is the only component that suspends. Every remote
//! check carries a [`RequestToken`](email::RequestToken); a resolution is
//! applied only while its token is still the active one, so the email error
//! always reflects the latest input regardless of response arrival order.

pub mod bound_field;
pub mod email;
pub mod errors;
pub mod fields;
pub mod form;
pub mod gate;
pub mod submission;
pub mod validation;
pub mod values;

pub use bound_field::{BoundField, FieldStatus};
pub use email::{
    EmailCheck, EmailValidator, EmailVerifier, InvalidReason, RequestToken, Resolution,
    ResolutionOutcome, Verdict, VerifyError, VerifyResponse,
};
pub use errors::FieldError;
pub use fields::{Field, FieldRules, FieldValue, FormValues, Gender};
pub use form::{PersonForm, SubmitState};
pub use gate::{GateBlocker, SubmitGate};
pub use submission::{JsonWriterSink, LogSink, PersonRecord, SubmissionSink};
pub use validation::{evaluate, evaluate_field, ErrorMap};
pub use values::{FieldMeta, FieldValueStore};
