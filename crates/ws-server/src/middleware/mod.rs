//! Request middleware.

pub(crate) mod context;
pub(crate) mod maintenance;
pub(crate) mod security;
