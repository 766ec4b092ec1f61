use statline_dataset::progress::null_progress;
use statline_dataset::registry::definition;
use statline_dataset::{DatasetKind, RecordStore, SchemaLoader};
use statline_region::RegionHierarchy;
use statline_region::loader::load_hierarchy;

const REGIONS_CSV: &str = include_str!("../../../test-data/regions.csv");
const POPULATION_CSV: &str = include_str!("../../../test-data/population.csv");
const CRIME_CSV: &str = include_str!("../../../test-data/crime.csv");
const HISTORY_CSV: &str = include_str!("../../../test-data/population_history.csv");

pub fn hierarchy() -> RegionHierarchy {
    load_hierarchy(REGIONS_CSV.as_bytes()).unwrap()
}

pub fn store_with(hierarchy: &RegionHierarchy, datasets: &[(DatasetKind, &str)]) -> RecordStore {
    let mut store = RecordStore::new();
    for (kind, csv) in datasets {
        let def = definition(*kind);
        let records = SchemaLoader::new(&def, hierarchy)
            .load(csv.as_bytes(), &null_progress())
            .unwrap();
        store.insert_dataset(*kind, def.coverage(), records);
    }
    store
}

pub fn store(hierarchy: &RegionHierarchy) -> RecordStore {
    store_with(
        hierarchy,
        &[
            (DatasetKind::PopulationDynamics, POPULATION_CSV),
            (DatasetKind::ViolentCrime, CRIME_CSV),
            (DatasetKind::PopulationHistory, HISTORY_CSV),
        ],
    )
}

pub const fn population_csv() -> &'static str {
    POPULATION_CSV
}

pub const fn crime_csv() -> &'static str {
    CRIME_CSV
}
