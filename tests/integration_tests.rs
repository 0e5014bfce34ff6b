use area_violin::batch::chart_path;
use area_violin::cohort::load_cohort;
use area_violin::config::{DatasetConfig, DatasetKind};
use area_violin::scoring::area::area_scores;
use area_violin::scoring::assemble::grade_scores;
use area_violin::scoring::utility::quartiles;
use std::path::{Path, PathBuf};

const PROFILE: &str = r##"{
    "kind": "literacy",
    "label": "literacy",
    "grade_column": "학년",
    "output_dir": "figure/sample",
    "violin_points": 100,
    "area_colors": [{ "area": "vocabulary", "hex": "#4C78A8" }],
    "generations": [{
        "year": 2024,
        "input": "sample_cohort.csv",
        "prefix": "p",
        "jobs": [{ "grade": 4, "code": 4 }, { "grade": 6, "code": 6 }],
        "mapping": [
            { "code": 4, "areas": [
                { "name": "vocabulary", "items": [1, 2] },
                { "name": "evaluation & application", "items": [30, 31] },
                { "name": "integration & interpretation", "items": [3] }
            ] },
            { "code": 6, "areas": [
                { "name": "vocabulary", "items": [1, 2] },
                { "name": "integration & interpretation", "items": [3] }
            ] }
        ]
    }]
}"##;

fn fixture() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/sample_cohort.csv")
}

#[test]
fn test_extractor_scores_with_partial_rows() {
    let cohort = load_cohort(&fixture()).expect("Failed to load fixture");
    let fourth = cohort.filter_eq("학년", 4);

    // Student 2 has no p02 answer, so only p01 counts.
    assert_eq!(area_scores(&fourth, &[1, 2], "p"), Some(vec![1.0, 0.0, 0.5]));
}

#[test]
fn test_assembled_table_for_grade() {
    let config = DatasetConfig::from_json(PROFILE).unwrap();
    let generation = &config.generations[0];
    let cohort = load_cohort(&fixture()).unwrap();

    let scores = grade_scores(
        &cohort,
        &config.grade_column,
        4,
        generation.areas_for(4).unwrap(),
        &generation.prefix,
    );

    assert_eq!(
        scores.area_names(),
        vec!["vocabulary", "integration & interpretation"]
    );
    assert_eq!(scores.get("integration & interpretation"), Some(&[1.0][..]));

    let q = quartiles(scores.get("vocabulary").unwrap()).unwrap();
    assert!(q.q1 <= q.median && q.median <= q.q3);
}

#[test]
fn test_non_numeric_cell_treated_as_missing() {
    let config = DatasetConfig::from_json(PROFILE).unwrap();
    let generation = &config.generations[0];
    let cohort = load_cohort(&fixture()).unwrap();

    let scores = grade_scores(&cohort, "학년", 6, generation.areas_for(6).unwrap(), "p");
    assert_eq!(scores.get("vocabulary"), Some(&[1.0, 0.0][..]));
    assert_eq!(scores.get("integration & interpretation"), Some(&[1.0][..]));
}

#[test]
fn test_absent_grade_code_yields_empty_columns() {
    let config = DatasetConfig::from_json(PROFILE).unwrap();
    let generation = &config.generations[0];
    let cohort = load_cohort(&fixture()).unwrap();

    let scores = grade_scores(&cohort, "학년", 10, generation.areas_for(4).unwrap(), "p");
    assert_eq!(scores.areas.len(), 2);
    assert!(scores.areas.iter().all(|a| a.scores.is_empty()));
}

#[test]
fn test_jobs_of_one_generation_get_distinct_outputs() {
    let config = DatasetConfig::from_json(PROFILE).unwrap();
    let generation = &config.generations[0];
    let out = Path::new("out");

    let paths: Vec<_> = generation
        .jobs
        .iter()
        .map(|j| chart_path(out, &config, generation.year, j.grade))
        .collect();

    assert_eq!(paths[0], out.join("figure/sample/violin_2024_4th.png"));
    assert_eq!(paths[1], out.join("figure/sample/violin_2024_6th.png"));
    assert!(config.title(2024, 6).contains("grade 6"));
    assert!(config.title(2024, 6).contains("2024"));
}

#[test]
fn test_builtin_profiles_cover_eight_jobs_each() {
    for kind in [DatasetKind::Numeracy, DatasetKind::Literacy] {
        let config = DatasetConfig::builtin(kind).unwrap();
        let jobs: usize = config.generations.iter().map(|g| g.jobs.len()).sum();
        assert_eq!(jobs, 8);
    }
}
