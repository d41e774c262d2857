//! Extension traits

mod depot;
mod list_query;
mod point_in_time;
mod result;

pub(crate) use depot::DepotExt as _;
pub(crate) use list_query::ListQueryParams;
pub(crate) use point_in_time::{PointInTimeExt as _, parse_timestamp};
pub(crate) use result::ResultExt as _;
