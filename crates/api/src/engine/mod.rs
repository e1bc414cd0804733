//! Generation and room engine.
//!
//! Contains the coordinator that submits generation jobs and folds webhook
//! deliveries back into tracks, plus the advancer that owns every mutation
//! of the shared room record.

pub mod advancer;
pub mod coordinator;
