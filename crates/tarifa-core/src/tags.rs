//! Deterministic CGRateS tag builders
//!
//! Every key the rating engine sees is derived from the brand id and an
//! internal database id, so repeated imports converge on the same rows.
//!
//! # Tag Patterns
//!
//! - `b{brand}` - tariff plan id (tpid) and CGRateS tenant of a brand
//! - `b{brand}dst{destination_id}` - destination mapping tag
//! - `b{brand}rt{destination_rate_id}` - rate tag
//! - `b{brand}dr{rate_group_id}` - destination-rate tag
//!
//! # Example
//!
//! ```
//! use tarifa_core::tags;
//!
//! assert_eq!(tags::tpid(7), "b7");
//! assert_eq!(tags::destination_tag(7, 42), "b7dst42");
//! ```

/// Infix of destination mapping tags
pub const DESTINATION_INFIX: &str = "dst";

/// Infix of rate tags
pub const RATE_INFIX: &str = "rt";

/// Infix of destination-rate tags
pub const DESTINATION_RATE_INFIX: &str = "dr";

/// Tariff plan id of a brand
pub fn tpid(brand_id: i32) -> String {
    format!("b{}", brand_id)
}

/// CGRateS tenant of a brand (same value as its tpid)
pub fn tenant(brand_id: i32) -> String {
    tpid(brand_id)
}

/// Prefix shared by all destination mapping tags of a brand
///
/// The database appends the destination id to obtain the full tag.
pub fn destination_tag_prefix(brand_id: i32) -> String {
    format!("b{}{}", brand_id, DESTINATION_INFIX)
}

/// Prefix shared by all rate tags of a brand
pub fn rate_tag_prefix(brand_id: i32) -> String {
    format!("b{}{}", brand_id, RATE_INFIX)
}

/// Destination mapping tag
pub fn destination_tag(brand_id: i32, destination_id: i64) -> String {
    format!("{}{}", destination_tag_prefix(brand_id), destination_id)
}

/// Rate tag
pub fn rate_tag(brand_id: i32, destination_rate_id: i64) -> String {
    format!("{}{}", rate_tag_prefix(brand_id), destination_rate_id)
}

/// Destination-rate tag of a rate group
pub fn destination_rate_tag(brand_id: i32, rate_group_id: i32) -> String {
    format!("b{}{}{}", brand_id, DESTINATION_RATE_INFIX, rate_group_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destination_tag() {
        assert_eq!(destination_tag(7, 42), "b7dst42");
        assert_eq!(destination_tag_prefix(7), "b7dst");
    }

    #[test]
    fn test_tpid_and_tenant() {
        assert_eq!(tpid(7), "b7");
        assert_eq!(tenant(7), tpid(7));
    }

    #[test]
    fn test_rate_tags() {
        assert_eq!(rate_tag(7, 1001), "b7rt1001");
        assert_eq!(destination_rate_tag(7, 5), "b7dr5");
    }

    #[test]
    fn test_tags_are_stable() {
        let first: Vec<String> = (1..50).map(|id| destination_tag(3, id)).collect();
        let second: Vec<String> = (1..50).map(|id| destination_tag(3, id)).collect();
        assert_eq!(first, second);
    }
}
