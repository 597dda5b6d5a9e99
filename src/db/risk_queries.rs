use crate::models::{BoundingBox, Coordinates, CrimeFilters, CrimeIncident, TimeWindow};
use sqlx::PgPool;
use time::OffsetDateTime;

/// Parameters of one incident fetch
#[derive(Debug, Clone)]
pub struct IncidentQuery {
    pub bbox: BoundingBox,
    pub filters: CrimeFilters,
    pub time: TimeWindow,
    /// +/- hours matched around `time.hour`
    pub hour_window: u8,
    /// IANA zone for hour/day/month extraction
    pub timezone: String,
    /// Most incidents the caller will count. The fetch returns up to one
    /// extra row so an overflow is visible.
    pub limit: i64,
}

/// Fetch located incidents inside a bounding box, narrowed by filters and
/// time of occurrence. Hour matching wraps around midnight.
pub async fn find_incidents(
    pool: &PgPool,
    query: &IncidentQuery,
) -> Result<Vec<CrimeIncident>, sqlx::Error> {
    let (date_from, date_to) = query
        .filters
        .date_range()
        .map_err(sqlx::Error::Protocol)?;

    let rows = sqlx::query_as::<_, IncidentRow>(
        r#"
        SELECT
            c.id AS case_id,
            l.latitude AS lat,
            l.longitude AS lng
        FROM crime_case c
        JOIN location l ON l.id = c.location_id
        WHERE l.latitude BETWEEN $1 AND $2
          AND l.longitude BETWEEN $3 AND $4
          AND ($5::int[] IS NULL OR c.crime_type_id = ANY($5))
          AND ($6::text[] IS NULL OR c.case_status = ANY($6))
          AND ($7::text[] IS NULL OR l.barangay = ANY($7))
          AND ($8::date IS NULL OR (c.incident_datetime AT TIME ZONE $14)::date >= $8)
          AND ($9::date IS NULL OR (c.incident_datetime AT TIME ZONE $14)::date <= $9)
          AND ($10::int IS NULL OR LEAST(
                ABS(EXTRACT(HOUR FROM c.incident_datetime AT TIME ZONE $14)::int - $10),
                24 - ABS(EXTRACT(HOUR FROM c.incident_datetime AT TIME ZONE $14)::int - $10)
              ) <= $11)
          AND ($12::int IS NULL OR EXTRACT(DOW FROM c.incident_datetime AT TIME ZONE $14)::int = $12)
          AND ($13::int IS NULL OR EXTRACT(MONTH FROM c.incident_datetime AT TIME ZONE $14)::int = $13)
        ORDER BY c.id
        LIMIT $15
        "#,
    )
    .bind(query.bbox.min_lat)
    .bind(query.bbox.max_lat)
    .bind(query.bbox.min_lng)
    .bind(query.bbox.max_lng)
    .bind(query.filters.crime_type_ids().map(|v| v.to_vec()))
    .bind(query.filters.status_filters().map(|v| v.to_vec()))
    .bind(query.filters.barangay_filters().map(|v| v.to_vec()))
    .bind(date_from)
    .bind(date_to)
    .bind(query.time.hour.map(i32::from))
    .bind(i32::from(query.hour_window))
    .bind(query.time.day.map(i32::from))
    .bind(query.time.month.map(i32::from))
    .bind(&query.timezone)
    .bind(query.limit.saturating_add(1))
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().filter_map(IncidentRow::into_incident).collect())
}

/// Insert a location and return its id
pub async fn insert_location(
    pool: &PgPool,
    coordinates: &Coordinates,
    barangay: Option<&str>,
    street_address: Option<&str>,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        INSERT INTO location (latitude, longitude, barangay, street_address)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(coordinates.lat)
    .bind(coordinates.lng)
    .bind(barangay)
    .bind(street_address)
    .fetch_one(pool)
    .await
}

/// Insert a crime case at an existing location and return its id
pub async fn insert_crime_case(
    pool: &PgPool,
    case_number: &str,
    crime_type_id: Option<i32>,
    case_status: &str,
    incident_datetime: OffsetDateTime,
    location_id: i64,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        INSERT INTO crime_case (case_number, crime_type_id, case_status, incident_datetime, location_id)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(case_number)
    .bind(crime_type_id)
    .bind(case_status)
    .bind(incident_datetime)
    .bind(location_id)
    .fetch_one(pool)
    .await
}

#[derive(sqlx::FromRow)]
struct IncidentRow {
    case_id: i64,
    lat: f64,
    lng: f64,
}

impl IncidentRow {
    fn into_incident(self) -> Option<CrimeIncident> {
        match Coordinates::new(self.lat, self.lng) {
            Ok(coordinates) => Some(CrimeIncident {
                case_id: self.case_id,
                coordinates,
            }),
            Err(e) => {
                tracing::warn!("Skipping crime case {} with bad location: {}", self.case_id, e);
                None
            }
        }
    }
}
