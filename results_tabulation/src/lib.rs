mod model;
mod store;

pub mod builder;
pub mod format;
pub mod manual;
pub mod rcv;
pub mod scale;
pub mod totals;
pub mod turnout;

pub use crate::model::*;
pub use crate::store::*;
