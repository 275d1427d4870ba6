#![doc = include_str!("../README.md")]
#![doc(test(attr(deny(warnings))))]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod error;
pub mod registry;
pub mod relay;
pub mod results;

pub mod api {
    pub use rdf_relay_api::*;
}

pub mod model {
    pub use rdf_relay_model::*;
}
