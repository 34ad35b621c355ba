use csv::ReaderBuilder;
use serde::Deserialize;
use std::fs::{self, File};
use std::path::Path;
use walkdir::WalkDir;

/// One pursuit query on a named map together with the result expected from it. A `path_len` of
/// zero means no path should be found.
#[derive(Clone, Debug, Deserialize)]
pub struct Scenario {
    pub id: u32,
    pub map: String,
    pub start_row: i32,
    pub start_col: i32,
    pub target_row: i32,
    pub target_col: i32,
    /// `soft` or `hard`.
    pub policy: String,
    pub path_len: usize,
    pub cost: f64,
    pub expansions: usize,
}

impl Scenario {
    pub fn start(&self) -> (i32, i32) {
        (self.start_row, self.start_col)
    }
    pub fn target(&self) -> (i32, i32) {
        (self.target_row, self.target_col)
    }
    pub fn is_hard(&self) -> bool {
        self.policy == "hard"
    }
}

fn load_benchmark(name: &str) -> (String, Vec<Scenario>) {
    let map_str = fs::read_to_string(Path::new(&format!("./maps/{}.map", name)))
        .expect("Could not read map file");

    let file = File::open(Path::new(&format!("./scenarios/{}.csv", name)))
        .expect("Could not open scenario file");
    let mut csv_reader = ReaderBuilder::new().has_headers(true).from_reader(file);

    let mut scenarios = Vec::new();
    for result in csv_reader.deserialize() {
        let record: Scenario = result.expect("Could not parse scenario record");
        assert_eq!(record.map, name, "scenario {} refers to another map", record.id);
        scenarios.push(record);
    }
    (map_str, scenarios)
}

/// Names of all maps under `maps/`, relative to the package root and without extension.
pub fn get_benchmark_names() -> Vec<String> {
    let root = Path::new("maps/");
    let root = root
        .canonicalize()
        .expect("Failed to canonicalize root path");
    let mut names = Vec::new();
    for entry in WalkDir::new(&root).into_iter() {
        let entry = entry.expect("Could not get dir entry");
        let path = entry.path();
        if path.extension().map_or(true, |ext| ext != "map") {
            continue;
        }
        let rel_path = path
            .strip_prefix(&root)
            .expect("Entry lies outside the maps directory")
            .with_extension("");
        names.push(rel_path.to_string_lossy().into_owned());
    }
    names.sort();
    names
}

/// Map text and scenarios of the benchmark `name`.
pub fn get_benchmark(name: String) -> (String, Vec<Scenario>) {
    let benchmark_names = get_benchmark_names();
    if benchmark_names.contains(&name) {
        load_benchmark(name.as_str())
    } else {
        panic!("Could not load benchmark {name}!");
    }
}
