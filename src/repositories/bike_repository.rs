use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::VehicleStore;
use crate::models::{
    BikeType, PageRequest, SearchFilters, SearchQuery, TheftReport, TheftReportDraft, VehicleDraft,
    VehicleIdentity, VehiclePage, VehicleStatus,
};
use crate::utils::errors::{not_found_error, validation_error, AppError, AppResult};

/// Columnas de `bikes` más el estado derivado. El alias de tabla es siempre `b`.
const BIKE_COLUMNS: &str = r#"
    b.id, b.vin, b.engine_number, b.license_plate, b.make, b.model, b.year, b.color,
    b.bike_type, b.created_at, b.updated_at,
    EXISTS(
        SELECT 1 FROM stolen_bike_reports r WHERE r.bike_id = b.id AND r.is_active
    ) AS is_stolen
"#;

const ACTIVE_REPORT_EXISTS: &str =
    "EXISTS(SELECT 1 FROM stolen_bike_reports r WHERE r.bike_id = b.id AND r.is_active)";

const REPORT_COLUMNS: &str = r#"
    id, bike_id, last_seen_location, last_seen_date, police_report_number,
    contact_phone, additional_details, reported_at, is_active
"#;

#[derive(Debug, sqlx::FromRow)]
struct BikeRow {
    id: Uuid,
    vin: String,
    engine_number: String,
    license_plate: Option<String>,
    make: String,
    model: String,
    year: i32,
    color: Option<String>,
    bike_type: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    is_stolen: bool,
}

impl From<BikeRow> for VehicleIdentity {
    fn from(row: BikeRow) -> Self {
        Self {
            id: row.id,
            vin: row.vin,
            engine_number: row.engine_number,
            license_plate: row.license_plate,
            make: row.make,
            model: row.model,
            year: row.year,
            color: row.color,
            // La tabla tiene un CHECK sobre los valores posibles
            bike_type: row.bike_type.parse().unwrap_or(BikeType::Other),
            status: VehicleStatus::from_report_exists(row.is_stolen),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ReportRow {
    id: Uuid,
    bike_id: Uuid,
    last_seen_location: String,
    last_seen_date: NaiveDateTime,
    police_report_number: Option<String>,
    contact_phone: String,
    additional_details: Option<String>,
    reported_at: DateTime<Utc>,
    is_active: bool,
}

impl From<ReportRow> for TheftReport {
    fn from(row: ReportRow) -> Self {
        Self {
            id: row.id,
            vehicle_id: row.bike_id,
            last_seen_location: row.last_seen_location,
            last_seen_date: row.last_seen_date,
            police_report_number: row.police_report_number,
            contact_phone: row.contact_phone,
            additional_details: row.additional_details,
            reported_at: row.reported_at,
            is_active: row.is_active,
        }
    }
}

/// Patrón ILIKE de subcadena con `%`, `_` y `\` escapados
pub fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

/// WHERE de la consulta más los filtros, con todos los valores enlazados
fn push_search_where(
    builder: &mut QueryBuilder<'_, Postgres>,
    query: &SearchQuery,
    filters: &SearchFilters,
) {
    builder.push(" WHERE ");
    match query {
        SearchQuery::Vin(term) => {
            builder.push("b.vin = ").push_bind(term.clone());
        }
        SearchQuery::EngineNumber(term) => {
            builder.push("b.engine_number = ").push_bind(term.clone());
        }
        SearchQuery::LicensePlate(term) => {
            builder.push("b.license_plate = ").push_bind(term.clone());
        }
        SearchQuery::MakeModel(term) => {
            let pattern = like_pattern(term);
            builder
                .push("(b.make ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR b.model ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
    }

    match filters.status {
        Some(VehicleStatus::Stolen) => {
            builder.push(" AND ").push(ACTIVE_REPORT_EXISTS);
        }
        Some(VehicleStatus::Clean) => {
            builder.push(" AND NOT ").push(ACTIVE_REPORT_EXISTS);
        }
        None => {}
    }

    let text_filters = [
        ("b.make", &filters.make),
        ("b.model", &filters.model),
        ("b.color", &filters.color),
    ];
    for (column, value) in text_filters {
        if let Some(value) = value {
            builder
                .push(format!(" AND LOWER({}) = LOWER(", column))
                .push_bind(value.clone())
                .push(")");
        }
    }

    if let Some(year) = filters.year {
        builder.push(" AND b.year = ").push_bind(year);
    }
}

/// Store de motos sobre PostgreSQL
#[derive(Clone)]
pub struct PgVehicleStore {
    pool: PgPool,
}

impl PgVehicleStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VehicleStore for PgVehicleStore {
    #[tracing::instrument(skip(self, draft), fields(vin = %draft.vin))]
    async fn create_vehicle(&self, draft: &VehicleDraft) -> AppResult<VehicleIdentity> {
        let now = Utc::now();
        let query = format!(
            r#"
            INSERT INTO bikes AS b (id, vin, engine_number, license_plate, make, model, year, color, bike_type, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)
            RETURNING {}
            "#,
            BIKE_COLUMNS
        );

        let row = sqlx::query_as::<_, BikeRow>(&query)
            .bind(Uuid::new_v4())
            .bind(&draft.vin)
            .bind(&draft.engine_number)
            .bind(&draft.license_plate)
            .bind(&draft.make)
            .bind(&draft.model)
            .bind(draft.year)
            .bind(&draft.color)
            .bind(draft.bike_type.as_str())
            .bind(now)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.into())
    }

    #[tracing::instrument(skip(self, draft))]
    async fn update_vehicle(&self, id: Uuid, draft: &VehicleDraft) -> AppResult<VehicleIdentity> {
        let query = format!(
            r#"
            UPDATE bikes AS b
            SET vin = $2, engine_number = $3, license_plate = $4, make = $5, model = $6,
                year = $7, color = $8, bike_type = $9, updated_at = $10
            WHERE b.id = $1
            RETURNING {}
            "#,
            BIKE_COLUMNS
        );

        let row = sqlx::query_as::<_, BikeRow>(&query)
            .bind(id)
            .bind(&draft.vin)
            .bind(&draft.engine_number)
            .bind(&draft.license_plate)
            .bind(&draft.make)
            .bind(&draft.model)
            .bind(draft.year)
            .bind(&draft.color)
            .bind(draft.bike_type.as_str())
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found_error("Bike", &id.to_string()))?;

        Ok(row.into())
    }

    #[tracing::instrument(skip(self, report))]
    async fn attach_theft_report(&self, vehicle_id: Uuid, report: &TheftReportDraft) -> AppResult<TheftReport> {
        let last_seen_date = report
            .last_seen_date
            .ok_or_else(|| validation_error("last_seen_date", "last seen date is required"))?;

        let query = format!(
            r#"
            INSERT INTO stolen_bike_reports ({columns})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, TRUE)
            RETURNING {columns}
            "#,
            columns = REPORT_COLUMNS
        );

        // bike_id inexistente => violación de FK => NotFound
        let row = sqlx::query_as::<_, ReportRow>(&query)
            .bind(Uuid::new_v4())
            .bind(vehicle_id)
            .bind(&report.last_seen_location)
            .bind(last_seen_date)
            .bind(&report.police_report_number)
            .bind(&report.contact_phone)
            .bind(&report.additional_details)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match AppError::from(e) {
                AppError::NotFound(_) => not_found_error("Bike", &vehicle_id.to_string()),
                other => other,
            })?;

        Ok(row.into())
    }

    #[tracing::instrument(skip(self))]
    async fn query_vehicles(&self, query: &SearchQuery) -> AppResult<Vec<VehicleIdentity>> {
        let mut builder = QueryBuilder::new(format!("SELECT {} FROM bikes b", BIKE_COLUMNS));
        push_search_where(&mut builder, query, &SearchFilters::default());
        builder.push(" ORDER BY b.created_at DESC");

        let rows = builder
            .build_query_as::<BikeRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(VehicleIdentity::from).collect())
    }

    #[tracing::instrument(skip(self))]
    async fn search_vehicles(
        &self,
        query: &SearchQuery,
        filters: &SearchFilters,
        page: PageRequest,
    ) -> AppResult<VehiclePage> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM bikes b");
        push_search_where(&mut count, query, filters);
        let total = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::new(format!("SELECT {} FROM bikes b", BIKE_COLUMNS));
        push_search_where(&mut select, query, filters);
        select
            .push(" ORDER BY b.created_at DESC LIMIT ")
            .push_bind(i64::from(page.page_size()))
            .push(" OFFSET ")
            .push_bind(i64::try_from(page.offset()).unwrap_or(i64::MAX));

        let rows = select
            .build_query_as::<BikeRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(VehiclePage {
            count: usize::try_from(total).unwrap_or(0),
            page: page.page(),
            page_size: page.page_size(),
            results: rows.into_iter().map(VehicleIdentity::from).collect(),
        })
    }

    async fn get_vehicle(&self, id: Uuid) -> AppResult<Option<VehicleIdentity>> {
        let sql = format!("SELECT {} FROM bikes b WHERE b.id = $1", BIKE_COLUMNS);

        let row = sqlx::query_as::<_, BikeRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(VehicleIdentity::from))
    }

    async fn list_active_reports(&self) -> AppResult<Vec<TheftReport>> {
        let sql = format!(
            "SELECT {} FROM stolen_bike_reports WHERE is_active ORDER BY reported_at DESC",
            REPORT_COLUMNS
        );

        let rows = sqlx::query_as::<_, ReportRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(TheftReport::from).collect())
    }
}
