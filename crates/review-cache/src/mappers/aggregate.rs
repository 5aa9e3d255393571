//! Aggregate entity <-> model mapper

use review_core::entities::VendorReviewAggregate;
use review_core::error::DomainError;
use review_core::value_objects::VendorId;

use super::{from_millis_opt, to_count, to_millis};
use crate::models::AggregateModel;

/// Convert AggregateModel to VendorReviewAggregate entity
impl TryFrom<AggregateModel> for VendorReviewAggregate {
    type Error = DomainError;

    fn try_from(model: AggregateModel) -> Result<Self, Self::Error> {
        Ok(VendorReviewAggregate {
            vendor_id: VendorId::new(model.vendor_id),
            total_reviews: to_count("total_reviews", model.total_reviews)?,
            histogram: [
                to_count("star_1", model.star_1)?,
                to_count("star_2", model.star_2)?,
                to_count("star_3", model.star_3)?,
                to_count("star_4", model.star_4)?,
                to_count("star_5", model.star_5)?,
            ],
            average_rating: model.average_rating,
            thirty_day_count: to_count("thirty_day_count", model.thirty_day_count)?,
            thirty_day_average: model.thirty_day_average,
            last_updated: from_millis_opt("last_updated", model.last_updated)?,
        })
    }
}

/// Values of a VendorReviewAggregate flattened for insertion
pub struct AggregateInsert<'a> {
    pub vendor_id: &'a str,
    pub total_reviews: i64,
    pub histogram: [i64; 5],
    pub average_rating: f64,
    pub thirty_day_count: i64,
    pub thirty_day_average: f64,
    pub last_updated: Option<i64>,
}

impl<'a> AggregateInsert<'a> {
    pub fn new(aggregate: &'a VendorReviewAggregate) -> Self {
        Self {
            vendor_id: aggregate.vendor_id.as_str(),
            total_reviews: i64::from(aggregate.total_reviews),
            histogram: aggregate.histogram.map(i64::from),
            average_rating: aggregate.average_rating,
            thirty_day_count: i64::from(aggregate.thirty_day_count),
            thirty_day_average: aggregate.thirty_day_average,
            last_updated: aggregate.last_updated.map(to_millis),
        }
    }
}
