//! Schema-validating CSV loader.
//!
//! Reads one source table against its [`DatasetDefinition`] and the region
//! hierarchy. Every data row becomes one [`RawRecord`] per measure column.
//! Any cell that cannot be interpreted stops the load with a
//! [`LoadError::SchemaViolation`] naming the row and column; nothing is
//! silently coerced to zero.

use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use statline_dataset_models::{Breakdown, MetricName, RawRecord};
use statline_region::RegionHierarchy;
use statline_region_models::RegionCode;

use crate::LoadError;
use crate::definition::DatasetDefinition;
use crate::labels::{parse_characteristic_label, parse_sex_label};
use crate::progress::ProgressCallback;

/// How often (in rows) progress is reported.
const PROGRESS_BATCH: u64 = 1_000;

/// Resolved header positions for one file.
struct ColumnIndex {
    region: usize,
    year: usize,
    sex: Option<usize>,
    characteristic: Option<usize>,
    measures: Vec<(usize, String, MetricName)>,
}

/// Loads a dataset against its definition and the region hierarchy.
pub struct SchemaLoader<'a> {
    definition: &'a DatasetDefinition,
    hierarchy: &'a RegionHierarchy,
}

impl<'a> SchemaLoader<'a> {
    /// Creates a loader for one dataset.
    #[must_use]
    pub const fn new(definition: &'a DatasetDefinition, hierarchy: &'a RegionHierarchy) -> Self {
        Self {
            definition,
            hierarchy,
        }
    }

    /// Loads a dataset from a file on disk.
    ///
    /// The file is read up front so the row total is known before parsing
    /// starts.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] if the file cannot be opened or any row
    /// violates the schema.
    pub fn load_path(
        &self,
        path: &Path,
        progress: &Arc<dyn ProgressCallback>,
    ) -> Result<Vec<RawRecord>, LoadError> {
        log::info!(
            "[{}] Loading {} from {}",
            self.definition.kind,
            self.definition.name,
            path.display()
        );
        let bytes = std::fs::read(path)?;
        progress.set_total(count_data_rows(&bytes));
        self.load(bytes.as_slice(), progress)
    }

    /// Loads a dataset from any reader.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::SchemaViolation`] for a missing column, an
    /// empty, malformed or unknown region code, a year outside the
    /// coverage window, an unparseable number, an unknown breakdown label,
    /// or a duplicate observation.
    pub fn load(
        &self,
        reader: impl Read,
        progress: &Arc<dyn ProgressCallback>,
    ) -> Result<Vec<RawRecord>, LoadError> {
        let def = self.definition;
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(def.delimiter_byte()?)
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        let columns = self.index_columns(&headers)?;

        progress.set_message(format!("Loading {}", def.kind));

        let mut records = Vec::new();
        let mut seen: BTreeSet<(RegionCode, i32, MetricName, Breakdown)> = BTreeSet::new();
        let mut rows: u64 = 0;

        for (idx, result) in rdr.records().enumerate() {
            let row = idx + 1;
            let record = result?;

            let region_code = self.parse_region(&record, row, columns.region)?;
            let year = self.parse_year(&record, row, columns.year)?;
            let breakdown = self.parse_breakdown(&record, row, &columns)?;

            for (col, name, metric) in &columns.measures {
                let value = self.parse_value(&record, row, *col, name)?;

                let key = (region_code.clone(), year, *metric, breakdown.clone());
                if !seen.insert(key) {
                    return Err(LoadError::violation(
                        def.kind,
                        row,
                        name,
                        format!("duplicate observation for {region_code} {year}"),
                    ));
                }

                records.push(RawRecord {
                    region_code: region_code.clone(),
                    year,
                    metric: *metric,
                    breakdown: breakdown.clone(),
                    value,
                });
            }

            rows += 1;
            if rows % PROGRESS_BATCH == 0 {
                progress.inc(PROGRESS_BATCH);
            }
        }

        progress.inc(rows % PROGRESS_BATCH);
        progress.finish(format!("[{}] {rows} rows loaded", def.kind));
        log::info!(
            "[{}] Loaded {rows} rows -> {} records",
            def.kind,
            records.len()
        );

        Ok(records)
    }

    fn index_columns(&self, headers: &csv::StringRecord) -> Result<ColumnIndex, LoadError> {
        let def = self.definition;
        let position = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim_start_matches('\u{feff}') == name)
        };
        let require = |name: &str| {
            position(name).ok_or_else(|| {
                LoadError::violation(def.kind, 0, name, "required column is missing")
            })
        };

        let region = require(&def.columns.region)?;
        let year = require(&def.columns.year)?;
        let sex = def.columns.sex.as_deref().map(require).transpose()?;
        let characteristic = def
            .columns
            .characteristic
            .as_deref()
            .map(require)
            .transpose()?;

        let mut measures = Vec::with_capacity(def.measures.len());
        for measure in &def.measures {
            match position(&measure.column) {
                Some(idx) => measures.push((idx, measure.column.clone(), measure.metric)),
                None if measure.required => {
                    return Err(LoadError::violation(
                        def.kind,
                        0,
                        &measure.column,
                        "required column is missing",
                    ));
                }
                None => log::debug!(
                    "[{}] Optional column '{}' not present, skipping",
                    def.kind,
                    measure.column
                ),
            }
        }

        Ok(ColumnIndex {
            region,
            year,
            sex,
            characteristic,
            measures,
        })
    }

    fn cell<'r>(
        &self,
        record: &'r csv::StringRecord,
        row: usize,
        col: usize,
        name: &str,
    ) -> Result<&'r str, LoadError> {
        record.get(col).ok_or_else(|| {
            LoadError::violation(self.definition.kind, row, name, "row is too short")
        })
    }

    fn parse_region(
        &self,
        record: &csv::StringRecord,
        row: usize,
        col: usize,
    ) -> Result<RegionCode, LoadError> {
        let kind = self.definition.kind;
        let name = &self.definition.columns.region;
        let raw = self.cell(record, row, col, name)?;

        if raw.is_empty() {
            return Err(LoadError::violation(kind, row, name, "region code is empty"));
        }
        let code = RegionCode::parse(raw)
            .map_err(|e| LoadError::violation(kind, row, name, e.to_string()))?;
        if !self.hierarchy.contains(&code) {
            return Err(LoadError::violation(
                kind,
                row,
                name,
                format!("region {code} is not in the hierarchy"),
            ));
        }
        Ok(code)
    }

    fn parse_year(
        &self,
        record: &csv::StringRecord,
        row: usize,
        col: usize,
    ) -> Result<i32, LoadError> {
        let def = self.definition;
        let name = &def.columns.year;
        let raw = self.cell(record, row, col, name)?;

        let year = raw.parse::<i32>().map_err(|_| {
            LoadError::violation(def.kind, row, name, format!("invalid year '{raw}'"))
        })?;
        if !def.coverage().contains(year) {
            return Err(LoadError::violation(
                def.kind,
                row,
                name,
                format!("year {year} outside coverage {}", def.coverage()),
            ));
        }
        Ok(year)
    }

    fn parse_breakdown(
        &self,
        record: &csv::StringRecord,
        row: usize,
        columns: &ColumnIndex,
    ) -> Result<Breakdown, LoadError> {
        let def = self.definition;
        let (Some(sex_col), Some(char_col), Some(sex_name), Some(char_name)) = (
            columns.sex,
            columns.characteristic,
            def.columns.sex.as_deref(),
            def.columns.characteristic.as_deref(),
        ) else {
            return Ok(Breakdown::TOTAL);
        };

        let raw_sex = self.cell(record, row, sex_col, sex_name)?;
        let sex = parse_sex_label(raw_sex).ok_or_else(|| {
            LoadError::violation(def.kind, row, sex_name, format!("unknown sex label '{raw_sex}'"))
        })?;

        let raw_char = self.cell(record, row, char_col, char_name)?;
        let characteristic = parse_characteristic_label(raw_char).ok_or_else(|| {
            LoadError::violation(
                def.kind,
                row,
                char_name,
                format!("unknown characteristic label '{raw_char}'"),
            )
        })?;

        Ok(Breakdown {
            sex,
            characteristic,
        })
    }

    fn parse_value(
        &self,
        record: &csv::StringRecord,
        row: usize,
        col: usize,
        name: &str,
    ) -> Result<Option<f64>, LoadError> {
        let def = self.definition;
        let raw = self.cell(record, row, col, name)?;
        if def.is_missing(raw) {
            return Ok(None);
        }

        let value = raw
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| {
                LoadError::violation(def.kind, row, name, format!("invalid number '{raw}'"))
            })?;
        if value < 0.0 {
            return Err(LoadError::violation(
                def.kind,
                row,
                name,
                format!("negative count {value}"),
            ));
        }
        Ok(Some(value))
    }
}

/// Non-blank lines after the header.
fn count_data_rows(bytes: &[u8]) -> u64 {
    let lines = bytes
        .split(|&b| b == b'\n')
        .filter(|line| !line.trim_ascii().is_empty())
        .count()
        .saturating_sub(1);
    u64::try_from(lines).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU64, Ordering};

    use super::*;
    use crate::progress::null_progress;
    use crate::registry::definition;
    use statline_dataset_models::{Characteristic, DatasetKind, Sex};
    use statline_region::loader::load_hierarchy;

    const REGIONS_CSV: &str = include_str!("../../../test-data/regions.csv");
    const POPULATION_CSV: &str = include_str!("../../../test-data/population.csv");
    const CRIME_CSV: &str = include_str!("../../../test-data/crime.csv");

    fn hierarchy() -> RegionHierarchy {
        load_hierarchy(REGIONS_CSV.as_bytes()).unwrap()
    }

    fn load(kind: DatasetKind, csv: &str) -> Result<Vec<RawRecord>, LoadError> {
        let def = definition(kind);
        let h = hierarchy();
        SchemaLoader::new(&def, &h).load(csv.as_bytes(), &null_progress())
    }

    fn expect_violation(
        result: Result<Vec<RawRecord>, LoadError>,
        want_row: usize,
        want_col: &str,
    ) {
        match result {
            Err(LoadError::SchemaViolation { row, column, .. }) => {
                assert_eq!(row, want_row);
                assert_eq!(column, want_col);
            }
            other => panic!("expected schema violation, got {other:?}"),
        }
    }

    const POP_HEADER: &str = "Region Code,Year,Population,Births,Deaths,Immigration,Emigration,\
                              Internal Migration In,Internal Migration Out";

    #[test]
    fn loads_population_fixture() {
        let records = load(DatasetKind::PopulationDynamics, POPULATION_CSV).unwrap();
        assert!(!records.is_empty());
        assert_eq!(records.len() % 7, 0);
        assert!(records.iter().all(|r| r.breakdown == Breakdown::TOTAL));
    }

    #[test]
    fn keeps_missing_markers_as_none() {
        let csv = format!("{POP_HEADER}\nNL01,2022,17590672,.,170112,x,,0,0\n");
        let records = load(DatasetKind::PopulationDynamics, &csv).unwrap();
        let births = records.iter().find(|r| r.metric == MetricName::Births).unwrap();
        assert_eq!(births.value, None);
        let immigration = records
            .iter()
            .find(|r| r.metric == MetricName::Immigration)
            .unwrap();
        assert_eq!(immigration.value, None);
        let deaths = records.iter().find(|r| r.metric == MetricName::Deaths).unwrap();
        assert_eq!(deaths.value, Some(170_112.0));
    }

    #[test]
    fn rejects_unparseable_number() {
        let csv = format!("{POP_HEADER}\nNL01,2022,17590672,lots,170112,1,1,0,0\n");
        expect_violation(load(DatasetKind::PopulationDynamics, &csv), 1, "Births");
    }

    #[test]
    fn rejects_missing_required_column() {
        let csv = "Region Code,Year,Population\nNL01,2022,17590672\n";
        expect_violation(load(DatasetKind::PopulationDynamics, csv), 0, "Births");
    }

    #[test]
    fn rejects_unknown_and_malformed_regions() {
        let csv = format!("{POP_HEADER}\nNL01,2022,1,1,1,1,1,0,0\nGM9999,2022,1,1,1,1,1,0,0\n");
        expect_violation(load(DatasetKind::PopulationDynamics, &csv), 2, "Region Code");

        let csv = format!("{POP_HEADER}\n,2022,1,1,1,1,1,0,0\n");
        expect_violation(load(DatasetKind::PopulationDynamics, &csv), 1, "Region Code");

        let csv = format!("{POP_HEADER}\nAMS,2022,1,1,1,1,1,0,0\n");
        expect_violation(load(DatasetKind::PopulationDynamics, &csv), 1, "Region Code");
    }

    #[test]
    fn rejects_year_outside_coverage() {
        let csv = format!("{POP_HEADER}\nNL01,2001,1,1,1,1,1,0,0\n");
        expect_violation(load(DatasetKind::PopulationDynamics, &csv), 1, "Year");
    }

    #[test]
    fn rejects_duplicate_observation() {
        let csv = format!("{POP_HEADER}\nNL01,2022,1,1,1,1,1,0,0\nnl01,2022,1,1,1,1,1,0,0\n");
        expect_violation(load(DatasetKind::PopulationDynamics, &csv), 2, "Population");
    }

    #[test]
    fn rejects_short_row() {
        let csv = format!("{POP_HEADER}\nNL01,2022,1,1\n");
        expect_violation(load(DatasetKind::PopulationDynamics, &csv), 1, "Deaths");
    }

    #[test]
    fn loads_crime_fixture_with_breakdowns() {
        let records = load(DatasetKind::ViolentCrime, CRIME_CSV).unwrap();
        let stabbing = records
            .iter()
            .find(|r| {
                r.year == 2023
                    && r.metric == MetricName::Victims
                    && r.breakdown.characteristic == Characteristic::Method("Stabbing".into())
            })
            .unwrap();
        assert_eq!(stabbing.breakdown.sex, Sex::Total);
        assert!(stabbing.value.is_some());
    }

    #[test]
    fn crime_published_rate_column_is_optional() {
        let csv = "Region Code,Period Label,Sex Label,Characteristics Label,\
                   VictimsMurderManslaughter_1\n\
                   NL01,2001,Total male and female,Total,264\n";
        let records = load(DatasetKind::ViolentCrime, csv).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].value, Some(264.0));
    }

    #[test]
    fn rejects_unknown_characteristic() {
        let csv = "Region Code,Period Label,Sex Label,Characteristics Label,\
                   VictimsMurderManslaughter_1\n\
                   NL01,2001,Total male and female,Weapon: Knife,12\n";
        expect_violation(load(DatasetKind::ViolentCrime, csv), 1, "Characteristics Label");
    }

    #[test]
    fn rejects_crime_year_before_coverage() {
        let csv = "Region Code,Period Label,Sex Label,Characteristics Label,\
                   VictimsMurderManslaughter_1\n\
                   NL01,1995,Total male and female,Total,250\n";
        expect_violation(load(DatasetKind::ViolentCrime, csv), 1, "Period Label");
    }

    #[derive(Default)]
    struct RecordingProgress {
        totals: Mutex<Vec<u64>>,
        advanced: AtomicU64,
    }

    impl ProgressCallback for RecordingProgress {
        fn set_total(&self, total: u64) {
            self.totals.lock().unwrap().push(total);
        }
        fn inc(&self, delta: u64) {
            self.advanced.fetch_add(delta, Ordering::Relaxed);
        }
        fn set_message(&self, _msg: String) {}
        fn finish(&self, _msg: String) {}
    }

    #[test]
    fn counts_data_rows_ignoring_header_and_blank_lines() {
        assert_eq!(count_data_rows(b"A,B\r\n1,2\r\n3,4\r\n\r\n"), 2);
        assert_eq!(count_data_rows(b"A,B"), 0);
        assert_eq!(count_data_rows(b""), 0);
    }

    #[test]
    fn load_path_reports_total_before_rows() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../test-data/population.csv");
        let recording = Arc::new(RecordingProgress::default());
        let progress: Arc<dyn ProgressCallback> = recording.clone();

        let def = definition(DatasetKind::PopulationDynamics);
        let h = hierarchy();
        SchemaLoader::new(&def, &h).load_path(&path, &progress).unwrap();

        assert_eq!(*recording.totals.lock().unwrap(), [14]);
        assert_eq!(recording.advanced.load(Ordering::Relaxed), 14);
    }
}
