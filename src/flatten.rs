//! Flatten API responses into one row per (series, month).
//!
//! Rows come out in response order: series as listed, then data points as
//! listed. Identical responses therefore always produce identical rows.

use tracing::debug;

use crate::data::bls::{ApiDataPoint, ApiResponse, Footnote};
use crate::data::item_code_of;
use crate::domain::{ItemTable, OutputRecord, Period, PeriodPolicy, SeriesId, YearMonth};
use crate::error::AppError;

#[derive(Debug, Clone, Copy)]
pub struct FlattenOptions {
    pub period_policy: PeriodPolicy,
    /// Keep only observations for this calendar month (1-12).
    pub month: Option<u32>,
}

/// Counters for one or more flattened responses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlattenStats {
    pub series: usize,
    pub rows: usize,
    /// Annual / semiannual points dropped under `PeriodPolicy::Skip`.
    pub skipped_periods: usize,
    /// Monthly points outside the requested month.
    pub filtered: usize,
}

impl FlattenStats {
    pub fn absorb(&mut self, other: FlattenStats) {
        self.series += other.series;
        self.rows += other.rows;
        self.skipped_periods += other.skipped_periods;
        self.filtered += other.filtered;
    }
}

/// Append one row per usable data point in `response` to `out`.
pub fn flatten_response(
    response: &ApiResponse,
    items: &ItemTable,
    options: &FlattenOptions,
    out: &mut Vec<OutputRecord>,
) -> Result<FlattenStats, AppError> {
    let mut stats = FlattenStats::default();

    for series in response.series() {
        let item_name = lookup_item_name(&series.series_id, items)?;
        stats.series += 1;

        for point in &series.data {
            let month = match Period::parse(&point.period) {
                Ok(Period::Month(m)) => m,
                Ok(_) => match options.period_policy {
                    PeriodPolicy::Skip => {
                        debug!(series = %series.series_id, year = %point.year, period = %point.period, "skipping non-monthly period");
                        stats.skipped_periods += 1;
                        continue;
                    }
                    PeriodPolicy::Reject => {
                        return Err(AppError::parse(format!(
                            "Series {} has non-monthly period '{}' for {}.",
                            series.series_id, point.period, point.year
                        )));
                    }
                },
                Err(e) => {
                    return Err(AppError::parse(format!("Series {}: {e}", series.series_id)));
                }
            };

            if options.month.is_some_and(|want| want != month) {
                stats.filtered += 1;
                continue;
            }

            out.push(to_record(&series.series_id, item_name, point, month)?);
            stats.rows += 1;
        }
    }

    Ok(stats)
}

fn lookup_item_name<'a>(series_id: &SeriesId, items: &'a ItemTable) -> Result<&'a str, AppError> {
    let code = item_code_of(series_id).ok_or_else(|| {
        AppError::lookup(format!("Series {series_id} does not carry the expected CPI prefix."))
    })?;
    items
        .name_for(code)
        .ok_or_else(|| AppError::lookup(format!("Series {series_id} has no item '{code}' in the input table.")))
}

fn to_record(series_id: &SeriesId, item_name: &str, point: &ApiDataPoint, month: u32) -> Result<OutputRecord, AppError> {
    let year = point
        .year
        .trim()
        .parse::<i32>()
        .map_err(|e| AppError::parse(format!("Series {series_id}: invalid year '{}': {e}", point.year)))?;
    let date = YearMonth::new(year, month)
        .ok_or_else(|| AppError::parse(format!("Series {series_id}: invalid date {year}-{month:02}.")))?;

    let cpi_value = parse_value(&point.value).ok_or_else(|| {
        AppError::parse(format!(
            "Series {series_id}: non-numeric value '{}' for {} {}.",
            point.value, point.year, point.period
        ))
    })?;

    Ok(OutputRecord {
        series_id: series_id.clone(),
        item_name: item_name.to_string(),
        date,
        cpi_value,
        footnotes: join_footnotes(&point.footnotes),
    })
}

fn parse_value(raw: &str) -> Option<f64> {
    let v = raw.trim().parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

/// Each non-empty footnote text followed by a comma.
fn join_footnotes(footnotes: &[Footnote]) -> String {
    let mut out = String::new();
    for text in footnotes.iter().filter_map(|f| f.text.as_deref()) {
        if !text.is_empty() {
            out.push_str(text);
            out.push(',');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ItemRecord;
    use crate::error::ErrorKind;

    fn items() -> ItemTable {
        [("SA0", "All items"), ("SAF", "Food and beverages")]
            .into_iter()
            .map(|(c, n)| ItemRecord {
                item_code: c.to_string(),
                item_name: n.to_string(),
            })
            .collect()
    }

    fn response(json: serde_json::Value) -> ApiResponse {
        serde_json::from_value(json).unwrap()
    }

    fn one_series(series_id: &str, data: serde_json::Value) -> ApiResponse {
        response(serde_json::json!({
            "status": "REQUEST_SUCCEEDED",
            "Results": {"series": [{"seriesID": series_id, "data": data}]}
        }))
    }

    fn point(year: &str, period: &str, value: &str) -> serde_json::Value {
        serde_json::json!({"year": year, "period": period, "value": value, "footnotes": [{}]})
    }

    const ALL: FlattenOptions = FlattenOptions {
        period_policy: PeriodPolicy::Skip,
        month: None,
    };

    #[test]
    fn single_point_becomes_one_row() {
        let resp = one_series("CUUR0000SA0", serde_json::json!([point("2023", "M06", "301.5")]));
        let mut out = Vec::new();
        let stats = flatten_response(&resp, &items(), &ALL, &mut out).unwrap();

        assert_eq!(stats.rows, 1);
        assert_eq!(
            out,
            vec![OutputRecord {
                series_id: SeriesId::new("CUUR0000SA0"),
                item_name: "All items".to_string(),
                date: YearMonth::new(2023, 6).unwrap(),
                cpi_value: 301.5,
                footnotes: String::new(),
            }]
        );
    }

    #[test]
    fn rows_keep_response_order_across_series() {
        let resp = response(serde_json::json!({
            "status": "REQUEST_SUCCEEDED",
            "Results": {"series": [
                {"seriesID": "CUUR0000SAF", "data": [point("2024", "M02", "2"), point("2024", "M01", "1")]},
                {"seriesID": "CUUR0000SA0", "data": [point("2024", "M01", "3")]}
            ]}
        }));
        let mut out = Vec::new();
        let stats = flatten_response(&resp, &items(), &ALL, &mut out).unwrap();

        assert_eq!(stats.series, 2);
        let got: Vec<(String, String, f64)> = out
            .iter()
            .map(|r| (r.item_name.clone(), r.date.to_string(), r.cpi_value))
            .collect();
        assert_eq!(
            got,
            vec![
                ("Food and beverages".to_string(), "2024-02".to_string(), 2.0),
                ("Food and beverages".to_string(), "2024-01".to_string(), 1.0),
                ("All items".to_string(), "2024-01".to_string(), 3.0),
            ]
        );
    }

    #[test]
    fn annual_average_skipped_by_default() {
        let resp = one_series(
            "CUUR0000SA0",
            serde_json::json!([point("2023", "M13", "304.7"), point("2023", "M12", "306.7")]),
        );
        let mut out = Vec::new();
        let stats = flatten_response(&resp, &items(), &ALL, &mut out).unwrap();
        assert_eq!(stats.skipped_periods, 1);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].date.to_string(), "2023-12");
    }

    #[test]
    fn annual_average_rejected_when_asked() {
        let resp = one_series("CUUR0000SA0", serde_json::json!([point("2023", "M13", "304.7")]));
        let opts = FlattenOptions {
            period_policy: PeriodPolicy::Reject,
            month: None,
        };
        let mut out = Vec::new();
        let err = flatten_response(&resp, &items(), &opts, &mut out).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert!(err.to_string().contains("M13"));
        assert!(out.is_empty());
    }

    #[test]
    fn semiannual_follows_the_same_policy() {
        let resp = one_series("CUUR0000SA0", serde_json::json!([point("2023", "S01", "300.0")]));
        let mut out = Vec::new();
        let stats = flatten_response(&resp, &items(), &ALL, &mut out).unwrap();
        assert_eq!(stats.skipped_periods, 1);
        assert!(out.is_empty());
    }

    #[test]
    fn malformed_period_is_always_fatal() {
        let resp = one_series("CUUR0000SA0", serde_json::json!([point("2023", "M00", "1")]));
        let err = flatten_response(&resp, &items(), &ALL, &mut Vec::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn non_numeric_value_is_parse_error() {
        let resp = one_series("CUUR0000SA0", serde_json::json!([point("2023", "M06", "-")]));
        let err = flatten_response(&resp, &items(), &ALL, &mut Vec::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert!(err.to_string().contains("CUUR0000SA0"));
    }

    #[test]
    fn unknown_series_is_lookup_error() {
        for id in ["CUUR0000SEHA", "CUSR0000SA0"] {
            let resp = one_series(id, serde_json::json!([point("2023", "M06", "1")]));
            let err = flatten_response(&resp, &items(), &ALL, &mut Vec::new()).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Lookup, "series {id}");
        }
    }

    #[test]
    fn month_filter_keeps_only_that_month() {
        let resp = one_series(
            "CUUR0000SA0",
            serde_json::json!([point("2024", "M05", "x"), point("2024", "M04", "313.548"), point("2024", "M03", "312.3")]),
        );
        let opts = FlattenOptions {
            period_policy: PeriodPolicy::Skip,
            month: Some(4),
        };
        let mut out = Vec::new();
        let stats = flatten_response(&resp, &items(), &opts, &mut out).unwrap();
        assert_eq!(stats.filtered, 2);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].date.to_string(), "2024-04");
        assert_eq!(out[0].cpi_value, 313.548);
    }

    #[test]
    fn footnotes_are_comma_joined() {
        let resp = one_series(
            "CUUR0000SA0",
            serde_json::json!([{
                "year": "2024", "period": "M01", "value": "1",
                "footnotes": [{"code": "P", "text": "Preliminary."}, {}, {"text": "Revised."}]
            }]),
        );
        let mut out = Vec::new();
        flatten_response(&resp, &items(), &ALL, &mut out).unwrap();
        assert_eq!(out[0].footnotes, "Preliminary.,Revised.,");
    }

    #[test]
    fn empty_results_produce_no_rows() {
        let resp = response(serde_json::json!({"status": "REQUEST_SUCCEEDED", "message": []}));
        let mut out = Vec::new();
        let stats = flatten_response(&resp, &items(), &ALL, &mut out).unwrap();
        assert_eq!(stats, FlattenStats::default());
    }
}
