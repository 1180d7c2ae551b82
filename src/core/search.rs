//! Search business logic - Finds bookable properties for a date range.
//!
//! The store is asked only for a bounded candidate set: active properties
//! (pre-filtered by city or country), their active apartments, price periods
//! and facility links. Every other predicate runs in process over that set:
//!
//! 1. price coverage: a property survives if at least one apartment can be
//!    priced for every night; its apartment list shrinks to those apartments
//! 2. price bounds on any nightly rate charged for the stay
//! 3. best-fit capacity when a party size is given
//! 4. facility tags (all requested tags must be present)
//! 5. geo radius around a named object or a point
//!
//! Facets are counted over the filtered set before ranking and paging.
//! Results rank by average rating (unrated last), then id.

use crate::{
    config::SearchSettings,
    core::{
        geo::{self, GeoPoint},
        pricing::{self, StayQuote, truncate_price},
        stay::StayRange,
    },
    entities::{
        Apartment, City, Facility, GeoObject, PricePeriod, Property, PropertyFacility, apartment,
        city, price_period, property, property_facility,
    },
    errors::{Error, Result},
};
use chrono::{NaiveDate, Utc};
use sea_orm::{QueryOrder, prelude::*};
use serde::Serialize;
use std::{
    cmp::Ordering,
    collections::{BTreeMap, BTreeSet, HashMap},
    fmt::Write,
};
use tracing::{debug, info, instrument};

/// Where a radius search is centred.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeoReference {
    /// A stored geo object (airport, station, landmark)
    GeoObject(i64),
    /// An arbitrary coordinate
    Point(GeoPoint),
}

/// Search filters. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchCriteria {
    /// Check-in; defaults to `search.default_start_offset_days` from today
    pub start_date: Option<NaiveDate>,
    /// Checkout; defaults to `search.default_end_offset_days` from today
    pub end_date: Option<NaiveDate>,
    /// Lowest acceptable nightly rate, inclusive
    pub price_from: Option<f64>,
    /// Highest acceptable nightly rate, inclusive
    pub price_to: Option<f64>,
    /// Restrict to one city
    pub city_id: Option<i64>,
    /// Restrict to one country
    pub country_id: Option<i64>,
    /// Radius search centre
    pub geo: Option<GeoReference>,
    /// Radius override; `search.radius_km` otherwise
    pub radius_km: Option<f64>,
    /// Minimum adults one apartment must sleep
    pub adult_capacity: Option<i32>,
    /// Minimum children one apartment must sleep
    pub children_capacity: Option<i32>,
    /// Facility ids the property must all have
    pub facilities: Vec<i64>,
    /// 1-based page number
    pub page: Option<u64>,
}

impl SearchCriteria {
    /// The stay being searched, filling missing dates from the defaults.
    ///
    /// # Errors
    /// `Error::InvalidDateRange` when the resulting range is empty.
    pub fn stay(&self, settings: &SearchSettings, today: NaiveDate) -> Result<StayRange> {
        let defaults = StayRange::from_offsets(
            today,
            settings.default_start_offset_days,
            settings.default_end_offset_days,
        )?;
        StayRange::new(
            self.start_date.unwrap_or_else(|| defaults.start_date()),
            self.end_date.unwrap_or_else(|| defaults.end_date()),
        )
    }

    const fn has_price_bounds(&self) -> bool {
        self.price_from.is_some() || self.price_to.is_some()
    }

    fn price_in_bounds(&self, price: f64) -> bool {
        self.price_from.is_none_or(|from| price >= from)
            && self.price_to.is_none_or(|to| price <= to)
    }

    /// Query string of the parameters the caller actually gave, without `page`.
    #[must_use]
    pub fn query_string(&self) -> String {
        let mut params: Vec<(String, String)> = Vec::new();
        let mut push = |key: &str, value: String| params.push((key.to_string(), value));

        if let Some(start) = self.start_date {
            push("start_date", start.to_string());
        }
        if let Some(end) = self.end_date {
            push("end_date", end.to_string());
        }
        if let Some(from) = self.price_from {
            push("price_from", from.to_string());
        }
        if let Some(to) = self.price_to {
            push("price_to", to.to_string());
        }
        if let Some(city_id) = self.city_id {
            push("city_id", city_id.to_string());
        }
        if let Some(country_id) = self.country_id {
            push("country_id", country_id.to_string());
        }
        match self.geo {
            Some(GeoReference::GeoObject(id)) => push("geoobject_id", id.to_string()),
            Some(GeoReference::Point(point)) => {
                push("lat", point.lat.to_string());
                push("long", point.long.to_string());
            }
            None => {}
        }
        if let Some(radius) = self.radius_km {
            push("radius_km", radius.to_string());
        }
        if let Some(adults) = self.adult_capacity {
            push("adult_capacity", adults.to_string());
        }
        if let Some(children) = self.children_capacity {
            push("children_capacity", children.to_string());
        }
        for facility_id in &self.facilities {
            push("facilities[]", facility_id.to_string());
        }

        params
            .into_iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("&")
    }

    fn validate(&self) -> Result<()> {
        for bound in [self.price_from, self.price_to].into_iter().flatten() {
            if !bound.is_finite() || bound < 0.0 {
                return Err(Error::InvalidAmount { amount: bound });
            }
        }
        if let Some(radius) = self.radius_km {
            if !radius.is_finite() || radius <= 0.0 {
                return Err(Error::Validation {
                    message: format!("Search radius must be positive, got {radius}"),
                });
            }
        }
        if let Some(GeoReference::Point(point)) = self.geo {
            if !point.is_valid() {
                return Err(Error::Validation {
                    message: format!("Invalid coordinates: {}, {}", point.lat, point.long),
                });
            }
        }
        for (field, value) in [
            ("adult_capacity", self.adult_capacity),
            ("children_capacity", self.children_capacity),
        ] {
            if let Some(value) = value.filter(|v| *v < 0) {
                return Err(Error::Validation {
                    message: format!("{field} cannot be negative, got {value}"),
                });
            }
        }
        if self.page == Some(0) {
            return Err(Error::Validation {
                message: "Pages are numbered from 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Source of property photo URLs, ordered for display.
pub trait PhotoSource: Send + Sync {
    /// Photo URLs of `property_id`, first one is the cover.
    fn photo_urls(&self, property_id: i64) -> Vec<String>;
}

/// Photo source for deployments without media storage.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPhotos;

impl PhotoSource for NoPhotos {
    fn photo_urls(&self, _property_id: i64) -> Vec<String> {
        Vec::new()
    }
}

/// An apartment that can host the searched stay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApartmentHit {
    /// Apartment id
    pub id: i64,
    /// Display name
    pub name: String,
    /// Max adults
    pub adult_capacity: i32,
    /// Max children
    pub children_capacity: i32,
    /// Floor area
    pub size: i32,
    /// Bathrooms
    pub bathrooms: i32,
    /// Whole-stay price, truncated to whole currency units
    pub price: i64,
}

/// A property in the search results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyHit {
    /// Property id
    pub id: i64,
    /// Display name
    pub name: String,
    /// Street address
    pub address: String,
    /// City name
    pub city: String,
    /// Average guest rating, if any booking was rated
    pub avg_rating: Option<f64>,
    /// Facility names, alphabetical
    pub facilities: Vec<String>,
    /// Apartments that fit the search
    pub apartments: Vec<ApartmentHit>,
    /// Photo URLs in display order
    pub photos: Vec<String>,
}

/// How many matching properties carry one facility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FacetCount {
    /// Facility name
    pub name: String,
    /// Matching properties with the facility, always > 0
    pub count: u64,
}

/// Page position and totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageMeta {
    /// 1-based current page
    pub current_page: u64,
    /// Last page, at least 1
    pub last_page: u64,
    /// Page size
    pub per_page: u64,
    /// Total matching items
    pub total: u64,
    /// 1-based index of the first item on this page
    pub from: Option<u64>,
    /// 1-based index of the last item on this page
    pub to: Option<u64>,
}

/// Navigation links that keep the caller's query parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageLinks {
    /// First page
    pub first: String,
    /// Last page
    pub last: String,
    /// Previous page, if any
    pub prev: Option<String>,
    /// Next page, if any
    pub next: Option<String>,
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    /// Items on this page
    pub data: Vec<T>,
    /// Position and totals
    pub meta: PageMeta,
    /// Navigation links
    pub links: PageLinks,
}

/// Search output: a page of properties plus facility facets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResults {
    /// Ranked, paginated properties
    pub properties: Page<PropertyHit>,
    /// Facility counts over all matches, most common first
    pub facilities: Vec<FacetCount>,
}

fn page_link(base_path: &str, query: &str, page: u64) -> String {
    let mut link = format!("{base_path}?");
    if !query.is_empty() {
        let _ = write!(link, "{query}&");
    }
    let _ = write!(link, "page={page}");
    link
}

/// Slices `items` to `page` and builds the page metadata and links.
///
/// # Errors
/// `Error::IntConversion` only for counts beyond the platform's range.
pub fn paginate<T>(
    items: Vec<T>,
    page: u64,
    per_page: u64,
    base_path: &str,
    query: &str,
) -> Result<Page<T>> {
    let per_page = per_page.max(1);
    let page = page.max(1);
    let total = u64::try_from(items.len())?;
    let last_page = total.div_ceil(per_page).max(1);

    let offset = (page - 1).saturating_mul(per_page);
    let data: Vec<T> = items
        .into_iter()
        .skip(usize::try_from(offset).unwrap_or(usize::MAX))
        .take(usize::try_from(per_page)?)
        .collect();
    let shown = u64::try_from(data.len())?;

    let meta = PageMeta {
        current_page: page,
        last_page,
        per_page,
        total,
        from: (shown > 0).then_some(offset + 1),
        to: (shown > 0).then_some(offset + shown),
    };
    let links = PageLinks {
        first: page_link(base_path, query, 1),
        last: page_link(base_path, query, last_page),
        prev: (page > 1).then(|| page_link(base_path, query, (page - 1).min(last_page))),
        next: (page < last_page).then(|| page_link(base_path, query, page + 1)),
    };
    Ok(Page { data, meta, links })
}

/// Orders by rating descending with unrated properties last, then by id.
fn rank(a: &(property::Model, String), b: &(property::Model, String)) -> Ordering {
    let by_rating = match (a.0.bookings_avg_rating, b.0.bookings_avg_rating) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_rating.then(a.0.id.cmp(&b.0.id))
}

/// Resolves the radius-search centre. An unknown geo object disables the
/// geo filter rather than failing the search.
async fn resolve_centre(
    db: &DatabaseConnection,
    reference: Option<GeoReference>,
) -> Result<Option<GeoPoint>> {
    match reference {
        None => Ok(None),
        Some(GeoReference::Point(point)) => Ok(Some(point)),
        Some(GeoReference::GeoObject(id)) => {
            let found = GeoObject::find_by_id(id).one(db).await?;
            if found.is_none() {
                debug!("Geo object {} not found, searching without radius", id);
            }
            Ok(found.map(|object| GeoPoint::new(object.lat, object.long)))
        }
    }
}

/// A property's apartments that survive pricing and capacity filters.
fn matching_apartments(
    criteria: &SearchCriteria,
    stay: StayRange,
    apartments: &[apartment::Model],
    periods: &HashMap<i64, Vec<price_period::Model>>,
) -> Vec<ApartmentHit> {
    let no_periods = Vec::new();
    let covered: Vec<(&apartment::Model, StayQuote)> = apartments
        .iter()
        .filter_map(|apartment| {
            let own = periods.get(&apartment.id).unwrap_or(&no_periods);
            pricing::quote_stay(own, stay).ok().map(|quote| (apartment, quote))
        })
        .collect();

    // Bounds apply to the rates actually charged, not to overridden periods
    if criteria.has_price_bounds() {
        let any_in_bounds = covered.iter().any(|(_, quote)| {
            quote.nights.iter().any(|rate| criteria.price_in_bounds(rate.price))
        });
        if !any_in_bounds {
            return Vec::new();
        }
    }

    let to_hit = |(apartment, quote): &(&apartment::Model, StayQuote)| ApartmentHit {
        id: apartment.id,
        name: apartment.name.clone(),
        adult_capacity: apartment.adult_capacity,
        children_capacity: apartment.children_capacity,
        size: apartment.size,
        bathrooms: apartment.bathrooms,
        price: truncate_price(quote.total),
    };

    if criteria.adult_capacity.is_none() && criteria.children_capacity.is_none() {
        return covered.iter().map(to_hit).collect();
    }

    let adults = criteria.adult_capacity.unwrap_or(0);
    let children = criteria.children_capacity.unwrap_or(0);
    covered
        .iter()
        .filter(|(apartment, _)| {
            apartment.adult_capacity >= adults && apartment.children_capacity >= children
        })
        .min_by_key(|(apartment, _)| {
            (apartment.adult_capacity, apartment.children_capacity, apartment.id)
        })
        .map(to_hit)
        .into_iter()
        .collect()
}

/// Runs a property search.
///
/// # Errors
/// - `Error::InvalidDateRange` for an empty stay
/// - `Error::InvalidAmount` / `Error::Validation` for malformed filters
/// - store errors
#[instrument(skip(db, settings, photos))]
pub async fn search(
    db: &DatabaseConnection,
    settings: &SearchSettings,
    photos: &dyn PhotoSource,
    criteria: &SearchCriteria,
) -> Result<SearchResults> {
    criteria.validate()?;
    let stay = criteria.stay(settings, Utc::now().date_naive())?;
    let radius_km = criteria.radius_km.unwrap_or(settings.radius_km);
    let centre = resolve_centre(db, criteria.geo).await?;

    let mut property_query = Property::find()
        .find_also_related(City)
        .filter(property::Column::IsActive.eq(true));
    if let Some(city_id) = criteria.city_id {
        property_query = property_query.filter(property::Column::CityId.eq(city_id));
    }
    if let Some(country_id) = criteria.country_id {
        property_query = property_query.filter(city::Column::CountryId.eq(country_id));
    }
    let candidates: Vec<(property::Model, String)> = property_query
        .order_by_asc(property::Column::Id)
        .all(db)
        .await?
        .into_iter()
        .map(|(found, city)| (found, city.map(|c| c.name).unwrap_or_default()))
        .collect();
    let property_ids: Vec<i64> = candidates.iter().map(|(p, _)| p.id).collect();

    let mut apartments_by_property: HashMap<i64, Vec<apartment::Model>> = HashMap::new();
    for found in Apartment::find()
        .filter(apartment::Column::PropertyId.is_in(property_ids.iter().copied()))
        .filter(apartment::Column::IsActive.eq(true))
        .order_by_asc(apartment::Column::Id)
        .all(db)
        .await?
    {
        apartments_by_property.entry(found.property_id).or_default().push(found);
    }

    let apartment_ids: Vec<i64> = apartments_by_property
        .values()
        .flatten()
        .map(|a| a.id)
        .collect();
    let mut periods: HashMap<i64, Vec<price_period::Model>> = HashMap::new();
    for period in PricePeriod::find()
        .filter(price_period::Column::ApartmentId.is_in(apartment_ids))
        .all(db)
        .await?
    {
        periods.entry(period.apartment_id).or_default().push(period);
    }

    let mut facilities_by_property: HashMap<i64, BTreeSet<i64>> = HashMap::new();
    for link in PropertyFacility::find()
        .filter(property_facility::Column::PropertyId.is_in(property_ids))
        .all(db)
        .await?
    {
        facilities_by_property
            .entry(link.property_id)
            .or_default()
            .insert(link.facility_id);
    }
    let facility_names: HashMap<i64, String> = Facility::find()
        .all(db)
        .await?
        .into_iter()
        .map(|f| (f.id, f.name))
        .collect();

    let no_tags = BTreeSet::new();
    let no_apartments = Vec::new();
    let mut matches: Vec<(property::Model, String, Vec<ApartmentHit>)> = Vec::new();
    for (candidate, city_name) in candidates {
        let tags = facilities_by_property.get(&candidate.id).unwrap_or(&no_tags);
        if !criteria.facilities.iter().all(|wanted| tags.contains(wanted)) {
            continue;
        }
        let in_radius = centre
            .is_none_or(|point| geo::within_radius(point, GeoPoint::from(&candidate), radius_km));
        if !in_radius {
            continue;
        }
        let apartments = apartments_by_property
            .get(&candidate.id)
            .unwrap_or(&no_apartments);
        let hits = matching_apartments(criteria, stay, apartments, &periods);
        if hits.is_empty() {
            continue;
        }
        matches.push((candidate, city_name, hits));
    }

    let mut counts: BTreeMap<i64, u64> = BTreeMap::new();
    for (matched, _, _) in &matches {
        for facility_id in facilities_by_property.get(&matched.id).unwrap_or(&no_tags) {
            *counts.entry(*facility_id).or_default() += 1;
        }
    }
    let mut facets: Vec<FacetCount> = counts
        .into_iter()
        .filter(|(_, count)| *count > 0)
        .filter_map(|(id, count)| {
            facility_names.get(&id).map(|name| FacetCount {
                name: name.clone(),
                count,
            })
        })
        .collect();
    facets.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));

    let mut ranked: Vec<((property::Model, String), Vec<ApartmentHit>)> = matches
        .into_iter()
        .map(|(found, city_name, hits)| ((found, city_name), hits))
        .collect();
    ranked.sort_by(|a, b| rank(&a.0, &b.0));

    let page = paginate(
        ranked,
        criteria.page.unwrap_or(1),
        settings.page_size,
        &settings.base_path,
        &criteria.query_string(),
    )?;

    let data = page
        .data
        .into_iter()
        .map(|((found, city_name), apartments)| {
            let mut facilities: Vec<String> = facilities_by_property
                .get(&found.id)
                .unwrap_or(&no_tags)
                .iter()
                .filter_map(|id| facility_names.get(id).cloned())
                .collect();
            facilities.sort();
            PropertyHit {
                photos: photos.photo_urls(found.id),
                id: found.id,
                name: found.name,
                address: found.address,
                city: city_name,
                avg_rating: found.bookings_avg_rating,
                facilities,
                apartments,
            }
        })
        .collect();

    info!(
        "Search {} to {} matched {} properties",
        stay.start_date(),
        stay.end_date(),
        page.meta.total
    );
    Ok(SearchResults {
        properties: Page {
            data,
            meta: page.meta,
            links: page.links,
        },
        facilities: facets,
    })
}
