//! Product Handlers

pub(crate) mod block;
pub(crate) mod create;
pub(crate) mod get;
pub(crate) mod index;
pub(crate) mod unblock;
