use crate::core::parsing::phrases_match;
use crate::models::{FilterSet, Listing};

/// Check if a listing passes every hard constraint of a filter set
///
/// This is Stage 1 of the ranking pipeline. Strict pass/fail: a listing
/// either satisfies all constraints or is dropped, there is no partial credit.
#[inline]
pub fn matches_filters(listing: &Listing, filters: &FilterSet) -> bool {
    within_budget(listing, filters)
        && meets_room_minimums(listing, filters)
        && !is_excluded_area(listing, filters)
        && matches_property_type(listing, filters)
}

/// Price inside the inclusive budget bounds
#[inline]
pub fn within_budget(listing: &Listing, filters: &FilterSet) -> bool {
    filters.budget_min.map_or(true, |min| listing.price >= min)
        && filters.budget_max.map_or(true, |max| listing.price <= max)
}

/// Bedroom and bathroom minimums
///
/// Upper bounds are soft: a buyer asking for "3, maybe 4" bedrooms still
/// wants to see a 5-bed, so maxima only feed explanations.
#[inline]
pub fn meets_room_minimums(listing: &Listing, filters: &FilterSet) -> bool {
    filters.bedrooms_min.map_or(true, |min| listing.bedrooms >= min)
        && filters.bathrooms_min.map_or(true, |min| listing.bathrooms >= min)
}

/// Area or postcode district named in the excluded set
#[inline]
pub fn is_excluded_area(listing: &Listing, filters: &FilterSet) -> bool {
    if filters.excluded_areas.is_empty() {
        return false;
    }

    let area = listing.area.trim().to_lowercase();
    let district = listing.postcode_district().map(str::to_lowercase);

    filters.excluded_areas.iter().any(|excluded| {
        let excluded = excluded.trim().to_lowercase();
        excluded == area || district.as_deref() == Some(excluded.as_str())
    })
}

/// Listing type matches one of the requested types, if any were requested
#[inline]
pub fn matches_property_type(listing: &Listing, filters: &FilterSet) -> bool {
    filters.property_types.is_empty()
        || filters
            .property_types
            .iter()
            .any(|wanted| phrases_match(wanted, &listing.property_type))
}
