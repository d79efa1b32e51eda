//! Application services: use-case orchestration.
//!
//! Each service module implements a single use-case by composing the
//! pipeline and policy layers with port trait calls. Services never import
//! from `crate::infra`, `crate::commands`, or `crate::output`.

pub mod apply;
pub mod policy_status;
