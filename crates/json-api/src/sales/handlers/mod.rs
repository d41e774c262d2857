//! Sale Handlers

pub(crate) mod bundles;
pub(crate) mod create;
pub(crate) mod delete;
pub(crate) mod get;
pub(crate) mod index;
pub(crate) mod products;
pub(crate) mod sync;
