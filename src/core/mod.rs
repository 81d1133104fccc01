pub mod etl;
pub mod pipeline;
pub mod rate;

pub use crate::domain::model::{RatePoint, RateReport, Series, SummaryStats};
pub use crate::domain::ports::{ConfigProvider, Pipeline, SeriesSource, Storage};
pub use crate::utils::error::Result;
