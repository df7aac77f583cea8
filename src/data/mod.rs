//! Typed load boundary for the two tabular sources.
//!
//! All coercion happens here, once: metric fields parse to finite f64
//! (anything else becomes 0.0), years parse to i32 (anything else is a
//! bad row), centroid coordinates must be finite. Downstream code never
//! re-checks numbers.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

pub const FLOW_COLUMNS: [&str; 7] = [
    "ReporterISO3",
    "PartnerISO3",
    "Year",
    "Value chains",
    "Temperature",
    "value_usd",
    "quantity_mt",
];

pub const CENTROID_COLUMNS: [&str; 4] = ["ReporterISO3", "Country", "x_lon", "y_lat"];

/// One trade-flow observation, immutable after load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowRecord {
    pub reporter_iso3: String,
    pub partner_iso3: String,
    pub year: i32,
    pub value_chain: String,
    pub temperature: String,
    pub value_usd: f64,
    pub quantity_mt: f64,
}

/// Display name and location for an ISO3 code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryCentroid {
    pub iso3: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetManifest {
    pub source: String,
    pub hash_sha256: String,
    pub rows: u64,
    pub bad_rows: u64,
    pub columns: Vec<String>,
    pub warnings: Vec<String>,
    pub generated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadReport {
    pub rows: u64,
    pub bad_rows: u64,
    pub warnings: Vec<String>,
}

/// Split one CSV line, honoring double-quoted fields (the product
/// column carries embedded commas).
pub fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut cur = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' => {
                if in_quotes && chars.peek() == Some(&'"') {
                    cur.push('"');
                    chars.next();
                } else {
                    in_quotes = !in_quotes;
                }
            }
            ',' if !in_quotes => {
                fields.push(cur.trim().to_string());
                cur = String::new();
            }
            _ => cur.push(c),
        }
    }
    fields.push(cur.trim().to_string());
    fields
}

/// Invalid / non-finite numerics become 0.0, never an error.
pub fn coerce_num(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(n) if n.is_finite() => n,
        _ => 0.0,
    }
}

fn header_index(header: &[String], expected: &[&str]) -> Result<Vec<usize>, String> {
    expected
        .iter()
        .map(|col| {
            header
                .iter()
                .position(|h| h == col)
                .ok_or_else(|| format!("missing column: {}", col))
        })
        .collect()
}

fn field<'a>(parts: &'a [String], idx: usize) -> &'a str {
    parts.get(idx).map(|s| s.as_str()).unwrap_or("")
}

/// Parse the flow dataset. Header is matched by column name, so column
/// order in the source does not matter. A missing header or missing
/// column is fatal; a malformed row is counted and skipped.
pub fn parse_flows(csv: &str) -> Result<(Vec<FlowRecord>, LoadReport), String> {
    let mut lines = csv.lines().filter(|l| !l.trim().is_empty());
    let header = match lines.next() {
        Some(l) => split_csv_line(l),
        None => return Err("empty flow dataset".to_string()),
    };
    let idx = header_index(&header, &FLOW_COLUMNS)?;

    let mut records = Vec::new();
    let mut bad_rows = 0u64;
    let mut warnings = Vec::new();

    for line in lines {
        let parts = split_csv_line(line);
        let reporter = field(&parts, idx[0]).to_string();
        let partner = field(&parts, idx[1]).to_string();
        if reporter.is_empty() {
            bad_rows += 1;
            if warnings.len() < 20 {
                warnings.push("bad_row: empty ReporterISO3".to_string());
            }
            continue;
        }
        let year = match field(&parts, idx[2]).parse::<i32>() {
            Ok(y) => y,
            Err(_) => {
                bad_rows += 1;
                if warnings.len() < 20 {
                    warnings.push(format!("bad_row: unparseable year {:?}", field(&parts, idx[2])));
                }
                continue;
            }
        };
        records.push(FlowRecord {
            reporter_iso3: reporter,
            partner_iso3: partner,
            year,
            value_chain: field(&parts, idx[3]).to_string(),
            temperature: field(&parts, idx[4]).to_string(),
            value_usd: coerce_num(field(&parts, idx[5])),
            quantity_mt: coerce_num(field(&parts, idx[6])),
        });
    }

    let report = LoadReport {
        rows: records.len() as u64,
        bad_rows,
        warnings,
    };
    Ok((records, report))
}

/// Parse the centroid reference dataset into an ISO3 lookup. Rows with
/// non-finite coordinates are skipped; lookups for absent codes fall
/// back to the raw code at display time, so no placeholder entries are
/// created here.
pub fn parse_centroids(
    csv: &str,
) -> Result<(HashMap<String, CountryCentroid>, LoadReport), String> {
    let mut lines = csv.lines().filter(|l| !l.trim().is_empty());
    let header = match lines.next() {
        Some(l) => split_csv_line(l),
        None => return Err("empty centroid dataset".to_string()),
    };
    let idx = header_index(&header, &CENTROID_COLUMNS)?;

    let mut centroids = HashMap::new();
    let mut bad_rows = 0u64;
    let mut warnings = Vec::new();

    for line in lines {
        let parts = split_csv_line(line);
        let iso3 = field(&parts, idx[0]).to_string();
        let lon: Result<f64, _> = field(&parts, idx[2]).parse();
        let lat: Result<f64, _> = field(&parts, idx[3]).parse();
        match (iso3.is_empty(), lat, lon) {
            (false, Ok(lat), Ok(lon)) if lat.is_finite() && lon.is_finite() => {
                centroids.insert(
                    iso3.clone(),
                    CountryCentroid {
                        iso3,
                        name: field(&parts, idx[1]).to_string(),
                        lat,
                        lon,
                    },
                );
            }
            _ => {
                bad_rows += 1;
                if warnings.len() < 20 {
                    warnings.push(format!("bad_row: centroid {:?}", field(&parts, idx[0])));
                }
            }
        }
    }

    let report = LoadReport {
        rows: centroids.len() as u64,
        bad_rows,
        warnings,
    };
    Ok((centroids, report))
}

/// SHA256 of the fetched dataset text, for the manifest.
pub fn sha256_hex(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

pub fn build_manifest(source: &str, csv: &str, report: &LoadReport, columns: &[&str]) -> DatasetManifest {
    DatasetManifest {
        source: source.to_string(),
        hash_sha256: sha256_hex(csv),
        rows: report.rows,
        bad_rows: report.bad_rows,
        columns: columns.iter().map(|s| s.to_string()).collect(),
        warnings: report.warnings.clone(),
        generated_at: crate::logging::ts_now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FLOWS: &str = "\
ReporterISO3,PartnerISO3,Year,\"Value chains\",Temperature,value_usd,quantity_mt
MAR,USA,2020,Citrus,Ambient,1000,50
ESP,USA,2020,\"Fruits, fresh\",Chilled,2500.5,120
PER,USA,2021,Citrus,Chilled,abc,30
,USA,2021,Citrus,Ambient,10,1
MAR,USA,20xx,Citrus,Ambient,10,1
";

    #[test]
    fn parses_flows_and_counts_bad_rows() {
        let (rows, report) = parse_flows(FLOWS).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(report.bad_rows, 2, "empty reporter + bad year");
        assert_eq!(rows[0].reporter_iso3, "MAR");
        assert_eq!(rows[0].year, 2020);
        assert_eq!(rows[1].value_chain, "Fruits, fresh", "quoted comma survives");
        assert_eq!(rows[1].value_usd, 2500.5);
    }

    #[test]
    fn invalid_numerics_coerce_to_zero() {
        let (rows, _) = parse_flows(FLOWS).unwrap();
        assert_eq!(rows[2].value_usd, 0.0, "non-numeric value_usd coerced");
        assert_eq!(rows[2].quantity_mt, 30.0);
        assert_eq!(coerce_num("inf"), 0.0);
        assert_eq!(coerce_num("NaN"), 0.0);
        assert_eq!(coerce_num("-12.5"), -12.5);
    }

    #[test]
    fn column_order_is_irrelevant() {
        let shuffled = "\
value_usd,Year,ReporterISO3,PartnerISO3,Temperature,\"Value chains\",quantity_mt
900,2019,NLD,DEU,Frozen,Citrus,44
";
        let (rows, report) = parse_flows(shuffled).unwrap();
        assert_eq!(report.bad_rows, 0);
        assert_eq!(rows[0].reporter_iso3, "NLD");
        assert_eq!(rows[0].value_usd, 900.0);
        assert_eq!(rows[0].quantity_mt, 44.0);
    }

    #[test]
    fn missing_column_is_fatal() {
        let err = parse_flows("ReporterISO3,Year\nMAR,2020\n").unwrap_err();
        assert!(err.contains("missing column"), "{}", err);
        assert!(parse_flows("").is_err(), "empty input is fatal");
    }

    #[test]
    fn parses_centroids_and_skips_bad_coords() {
        let csv = "\
ReporterISO3,Country,x_lon,y_lat
MAR,Morocco,-7.09,31.79
USA,United States,-98.58,39.83
BAD,Nowhere,not_a_lon,12.0
";
        let (map, report) = parse_centroids(csv).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(report.bad_rows, 1);
        let usa = map.get("USA").unwrap();
        assert_eq!(usa.name, "United States");
        assert!((usa.lat - 39.83).abs() < 1e-9);
        assert!(map.get("XYZ").is_none(), "absent codes are just absent");
    }

    #[test]
    fn manifest_hash_is_reproducible() {
        let h1 = sha256_hex(FLOWS);
        let h2 = sha256_hex(FLOWS);
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);
        let (_, report) = parse_flows(FLOWS).unwrap();
        let m = build_manifest("mem://flows", FLOWS, &report, &FLOW_COLUMNS);
        assert_eq!(m.rows, 3);
        assert_eq!(m.bad_rows, 2);
        assert_eq!(m.columns.len(), 7);
    }
}
