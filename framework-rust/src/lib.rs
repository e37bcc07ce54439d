//! Encoded data representation for a generalization-based anonymization engine.
//!
//! Raw rows are interned column-by-column into a [`Dictionary`](dictionary::Dictionary)
//! and stored as dense integer codes in a [`DataMatrix`](matrix::DataMatrix).
//! The [`DataManager`](manager::DataManager) partitions the attributes of a dataset into
//! the generalized and the analyzed projections, builds one
//! [`GeneralizationHierarchy`](hierarchy::GeneralizationHierarchy) per generalized attribute
//! and exposes the bounds, domain shares and distributions that metrics and search consume.

// `error_chain!` can recurse deeply
#![recursion_limit = "1024"]
#[macro_use]
extern crate error_chain;
#[macro_use]
extern crate log;

#[doc(hidden)]
pub mod errors {
    // Create the Error, ErrorKind, ResultExt, and Result types
    error_chain! {
        foreign_links {
            Json(::serde_json::Error);
        }
    }
}

#[doc(hidden)]
pub use errors::*;

pub mod aggregation;
pub mod base;
pub mod criteria;
pub mod data;
pub mod dictionary;
pub mod hierarchy;
pub mod manager;
pub mod matrix;
pub mod shares;
pub mod utilities;

pub use crate::aggregation::{AggregateFunction, DataAggregationInformation};
pub use crate::base::{AttributeDefinition, AttributeKind, DataDefinition, DataType, HierarchyOrigin};
pub use crate::criteria::{GeneralizationScheme, PrivacyCriterion};
pub use crate::data::Data;
pub use crate::dictionary::Dictionary;
pub use crate::hierarchy::GeneralizationHierarchy;
pub use crate::manager::{DataManager, ManagerOptions};
pub use crate::shares::DomainShare;
pub use crate::utilities::row_set::RowSet;

// define the useful macro for building hashsets of attribute names
#[macro_export]
#[doc(hidden)]
macro_rules! attributes {
    ($( $name: expr ),*) => {{
         #[allow(unused_mut)]
         let mut set = ::indexmap::IndexSet::<String>::new();
         $( set.insert($name.to_string()); )*
         set
    }}
}
