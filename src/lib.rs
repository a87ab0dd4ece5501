// Library exports for ragbi
pub mod biclique;
pub mod config;
pub mod error;
pub mod gene;
pub mod hit;
pub mod hit_parser;
pub mod input;
pub mod interval;
pub mod pipeline;
pub mod reference;
pub mod report;
pub mod result;
pub mod scoring;
pub mod union_find;

pub use config::BlockConfig;
pub use error::BlockError;
pub use pipeline::{QueryContext, QueryInput};
pub use result::RankedResult;
