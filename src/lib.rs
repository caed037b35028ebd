//! ovh-reconciler - converges an OVH DNS zone to a declarative record file
//!
//! Pipeline:
//! - [`record`]: parse the desired state into normalized records
//! - [`fetch`]: snapshot the live zone through a [`zone_api::ZoneApi`]
//! - [`diff`]: set difference under normalized equality
//! - [`apply`]: deletes then creates, failures isolated per record

pub mod apply;
pub mod config;
pub mod constants;
pub mod diff;
pub mod error;
pub mod fetch;
pub mod ovh;
pub mod reconciler;
pub mod record;
pub mod validation;
pub mod zone_api;
