use chrono::Utc;
use serde::Serialize;
use thiserror::Error;

use crate::auth::{check_role, AuthenticatedUser};
use crate::domain::category::NewCategory;
use crate::domain::types::{CategoryName, CategorySlug, UserRole};
use crate::forms::import_export::{ParsedUpload, UploadMode};
use crate::repository::{
    BookingListQuery, BookingReader, BusinessReader, CategoryReader, CategoryWriter, ServiceReader,
    UserReader,
};
use crate::services::bookings::booking_dto;

use super::{ServiceError, ServiceResult};

/// Row-level upload error used for UI reporting.
#[derive(Debug, Clone, Serialize)]
pub struct UploadRowError {
    pub row_number: usize,
    pub slug: Option<String>,
    pub message: String,
}

/// Aggregated upload outcome report.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UploadReport {
    pub total_rows: usize,
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub errors: Vec<UploadRowError>,
}

impl UploadReport {
    pub fn with_total(total_rows: usize) -> Self {
        Self {
            total_rows,
            ..Self::default()
        }
    }

    pub fn push_error(
        &mut self,
        row_number: usize,
        slug: Option<String>,
        message: impl Into<String>,
    ) {
        self.skipped += 1;
        self.errors.push(UploadRowError {
            row_number,
            slug,
            message: message.into(),
        });
    }
}

fn row_tags(raw: Option<&String>) -> Vec<String> {
    raw.map(|value| {
        value
            .split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

/// Apply a parsed category upload row by row.
///
/// Full mode requires every column; partial mode patches existing rows,
/// falling back to stored values for absent columns.
pub fn import_categories<R>(
    parsed: ParsedUpload,
    user: &AuthenticatedUser,
    repo: &R,
) -> ServiceResult<UploadReport>
where
    R: CategoryReader + CategoryWriter,
{
    if !check_role(UserRole::Admin, user) {
        return Err(ServiceError::Unauthorized);
    }

    let mut report = UploadReport::with_total(parsed.rows.len());

    for row in &parsed.rows {
        let raw_slug = row.values.get("slug").cloned().unwrap_or_default();
        let slug = match CategorySlug::new(raw_slug.clone()) {
            Ok(slug) => slug,
            Err(e) => {
                report.push_error(row.row_number, Some(raw_slug), e.to_string());
                continue;
            }
        };

        let existing = match repo.get_category_by_slug(&slug) {
            Ok(existing) => existing,
            Err(e) => {
                log::error!("Failed to look up category: {e}");
                report.push_error(row.row_number, Some(slug.to_string()), "lookup failed");
                continue;
            }
        };

        match existing {
            Some(current) => {
                let name = match row.values.get("name").filter(|n| !n.is_empty()) {
                    Some(name) => match CategoryName::new(name.clone()) {
                        Ok(name) => name,
                        Err(e) => {
                            report.push_error(row.row_number, Some(slug.to_string()), e.to_string());
                            continue;
                        }
                    },
                    None => current.name.clone(),
                };
                let update = crate::domain::category::CategoryUpdate {
                    name,
                    description: row
                        .values
                        .get("description")
                        .filter(|d| !d.is_empty())
                        .cloned()
                        .or(current.description),
                    icon: row
                        .values
                        .get("icon")
                        .filter(|i| !i.is_empty())
                        .cloned()
                        .unwrap_or(current.icon),
                    tags: if row.values.contains_key("tags") {
                        row_tags(row.values.get("tags"))
                    } else {
                        current.tags
                    },
                };
                match repo.update_category(&slug, &update) {
                    Ok(_) => report.updated += 1,
                    Err(e) => {
                        log::error!("Failed to update category: {e}");
                        report.push_error(row.row_number, Some(slug.to_string()), "update failed");
                    }
                }
            }
            None => {
                if parsed.mode == UploadMode::Partial && !row.values.contains_key("name") {
                    report.push_error(
                        row.row_number,
                        Some(slug.to_string()),
                        "new categories require a name column",
                    );
                    continue;
                }
                let name = match row.values.get("name").filter(|n| !n.is_empty()) {
                    Some(name) => match CategoryName::new(name.clone()) {
                        Ok(name) => name,
                        Err(e) => {
                            report.push_error(row.row_number, Some(slug.to_string()), e.to_string());
                            continue;
                        }
                    },
                    None => {
                        report.push_error(
                            row.row_number,
                            Some(slug.to_string()),
                            "name cannot be empty",
                        );
                        continue;
                    }
                };
                let now = Utc::now().naive_utc();
                let category = NewCategory {
                    slug: slug.clone(),
                    name,
                    description: row
                        .values
                        .get("description")
                        .filter(|d| !d.is_empty())
                        .cloned(),
                    icon: row.values.get("icon").cloned().unwrap_or_default(),
                    tags: row_tags(row.values.get("tags")),
                    created_at: now,
                    updated_at: now,
                };
                match repo.create_category(&category) {
                    Ok(_) => report.created += 1,
                    Err(e) => {
                        log::error!("Failed to create category: {e}");
                        report.push_error(row.row_number, Some(slug.to_string()), "insert failed");
                    }
                }
            }
        }
    }

    Ok(report)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadFormat {
    Csv,
    Xlsx,
}

impl TryFrom<&str> for DownloadFormat {
    type Error = DownloadError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "xlsx" => Ok(Self::Xlsx),
            other => Err(DownloadError::InvalidFormat(other.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DownloadFile {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("invalid download format: {0}")]
    InvalidFormat(String),
    #[error("failed to render csv")]
    CsvRender,
    #[error("failed to render xlsx")]
    XlsxRender,
}

pub fn render_download_file(
    base_name: &str,
    format: DownloadFormat,
    headers: &[&str],
    rows: &[Vec<String>],
) -> Result<DownloadFile, DownloadError> {
    match format {
        DownloadFormat::Csv => {
            let mut writer = csv::Writer::from_writer(vec![]);
            writer
                .write_record(headers)
                .map_err(|_| DownloadError::CsvRender)?;
            for row in rows {
                let escaped_row: Vec<String> =
                    row.iter().map(|value| escape_csv_cell(value)).collect();
                writer
                    .write_record(&escaped_row)
                    .map_err(|_| DownloadError::CsvRender)?;
            }
            let bytes = writer.into_inner().map_err(|_| DownloadError::CsvRender)?;
            Ok(DownloadFile {
                file_name: format!("{base_name}.csv"),
                content_type: "text/csv; charset=utf-8",
                bytes,
            })
        }
        DownloadFormat::Xlsx => {
            let mut workbook = rust_xlsxwriter::Workbook::new();
            let worksheet = workbook.add_worksheet();

            for (col_idx, header) in headers.iter().enumerate() {
                worksheet
                    .write_string(0, col_idx as u16, *header)
                    .map_err(|_| DownloadError::XlsxRender)?;
            }

            for (row_idx, row) in rows.iter().enumerate() {
                let sheet_row = (row_idx + 1) as u32;
                for (col_idx, value) in row.iter().enumerate() {
                    worksheet
                        .write_string(sheet_row, col_idx as u16, value)
                        .map_err(|_| DownloadError::XlsxRender)?;
                }
            }

            let bytes = workbook
                .save_to_buffer()
                .map_err(|_| DownloadError::XlsxRender)?;
            Ok(DownloadFile {
                file_name: format!("{base_name}.xlsx"),
                content_type: "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
                bytes,
            })
        }
    }
}

const BOOKING_EXPORT_HEADERS: [&str; 10] = [
    "id",
    "business",
    "service",
    "customer",
    "booking_time",
    "duration_minutes",
    "price",
    "status",
    "payment_method",
    "payment_received",
];

/// Render the full booking ledger as a downloadable file.
pub fn export_bookings<R>(
    format: DownloadFormat,
    user: &AuthenticatedUser,
    repo: &R,
) -> ServiceResult<DownloadFile>
where
    R: BookingReader + BusinessReader + ServiceReader + UserReader,
{
    if !check_role(UserRole::Admin, user) {
        return Err(ServiceError::Unauthorized);
    }

    let (_total, bookings) = match repo.list_bookings(BookingListQuery::default()) {
        Ok(result) => result,
        Err(e) => {
            log::error!("Failed to list bookings: {e}");
            return Err(ServiceError::Internal);
        }
    };

    let rows: Vec<Vec<String>> = bookings
        .iter()
        .map(|booking| {
            let dto = booking_dto(booking, repo);
            vec![
                dto.id.to_string(),
                dto.business_name,
                dto.service_name,
                dto.customer_name,
                dto.booking_time,
                dto.duration_minutes.to_string(),
                format!("{:.2}", dto.price),
                dto.status,
                dto.payment_method,
                dto.payment_received.to_string(),
            ]
        })
        .collect();

    render_download_file("bookings", format, &BOOKING_EXPORT_HEADERS, &rows).map_err(|e| {
        log::error!("Failed to render booking export: {e}");
        ServiceError::Internal
    })
}

fn escape_csv_cell(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some('=' | '+' | '-' | '@') => format!("'{value}"),
        _ => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::import_export::{ParsedUploadRow, UploadFormat};
    use crate::repository::test::TestRepository;
    use std::collections::HashMap;

    fn admin_claims() -> AuthenticatedUser {
        AuthenticatedUser {
            sub: 10,
            email: "admin@example.com".into(),
            name: "Admin".into(),
            role: "admin".into(),
        }
    }

    fn row(number: usize, pairs: &[(&str, &str)]) -> ParsedUploadRow {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ParsedUploadRow {
            row_number: number,
            values,
        }
    }

    #[test]
    fn csv_export_escapes_formula_prefixed_cells() {
        let file = render_download_file(
            "bookings",
            DownloadFormat::Csv,
            &["customer", "notes"],
            &[vec!["=SUM(A1:A2)".to_string(), "+malicious".to_string()]],
        )
        .expect("csv render should succeed");

        let csv_output = String::from_utf8(file.bytes).expect("csv output should be utf-8");
        assert!(csv_output.contains("'=SUM(A1:A2)"));
        assert!(csv_output.contains("'+malicious"));
    }

    #[test]
    fn csv_export_keeps_safe_cells_unchanged() {
        let file = render_download_file(
            "bookings",
            DownloadFormat::Csv,
            &["customer", "business"],
            &[vec!["Alice".to_string(), "Smith Plumbing".to_string()]],
        )
        .expect("csv render should succeed");

        let csv_output = String::from_utf8(file.bytes).expect("csv output should be utf-8");
        assert!(csv_output.contains("Alice"));
        assert!(csv_output.contains("Smith Plumbing"));
    }

    #[test]
    fn import_creates_categories_and_reports_errors() {
        let repo = TestRepository::new();
        let parsed = ParsedUpload {
            format: UploadFormat::Csv,
            mode: UploadMode::Full,
            headers: vec![
                "slug".to_string(),
                "name".to_string(),
                "description".to_string(),
                "icon".to_string(),
                "tags".to_string(),
            ],
            rows: vec![
                row(
                    2,
                    &[
                        ("slug", "pest-control"),
                        ("name", "Pest Control"),
                        ("description", ""),
                        ("icon", "bug-fill"),
                        ("tags", "rats, wasps"),
                    ],
                ),
                row(
                    3,
                    &[
                        ("slug", ""),
                        ("name", "Broken"),
                        ("description", ""),
                        ("icon", ""),
                        ("tags", ""),
                    ],
                ),
            ],
        };

        let report = import_categories(parsed, &admin_claims(), &repo).unwrap();
        assert_eq!(report.total_rows, 2);
        assert_eq!(report.created, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].row_number, 3);
    }

    #[test]
    fn import_requires_admin() {
        let repo = TestRepository::new();
        let parsed = ParsedUpload {
            format: UploadFormat::Csv,
            mode: UploadMode::Full,
            headers: vec![],
            rows: vec![],
        };
        let customer = AuthenticatedUser {
            sub: 1,
            email: "alice@example.com".into(),
            name: "Alice".into(),
            role: "customer".into(),
        };
        let err = import_categories(parsed, &customer, &repo).unwrap_err();
        assert_eq!(err, ServiceError::Unauthorized);
    }
}
