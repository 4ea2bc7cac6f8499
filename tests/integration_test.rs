use std::io::Read;
use std::path::PathBuf;

use exam_grader::error::{AppError, ConfigError, DocumentError};
use exam_grader::models::{parse_exam_config, ExtractionMiss, ScoreList};
use exam_grader::services::{extract_keys, extract_records, score, SourceKind};
use exam_grader::{
    App, BookletMode, Config, DocumentReader, ExamConfig, GradeRequest, PointsMode, Variant,
};

const KEY_A: &str = "CDBCBCBDCBBCCABEBBCABBCBC";
const KEY_B: &str = "BBCBBDBABCBCCCCCAEBCDBBBC";

fn results_text() -> String {
    format!(
        "Sinav Sonuclari\n\
         A Kitapcigi Cevap Anahtari: {KEY_A}\n\
         B Kitapcigi Cevap Anahtari: {KEY_B}\n\
         \n\
         No   Numara     Ad Soyad        Cevaplar\n\
         1    20231045   Ayse Yilmaz     {KEY_A} A\n\
         2    20231046   Mehmet Demir    {KEY_B} B\n\
         3    20231047   Ali Veli        CDBCBCBDCBEEE\n"
    )
}

fn reader() -> DocumentReader {
    DocumentReader::new().unwrap()
}

/// 每个测试使用独立的临时目录
fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("exam_grader_{}_{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn test_config(dir: &PathBuf) -> Config {
    Config {
        output_dir: dir.join("output").to_string_lossy().to_string(),
        output_log_file: dir.join("output.txt").to_string_lossy().to_string(),
        warn_file: dir.join("warn.txt").to_string_lossy().to_string(),
        max_concurrent_students: 2,
        ..Config::default()
    }
}

#[test]
fn test_pipeline_two_booklets() {
    let document = reader().from_text(&results_text());
    let mut exam = ExamConfig::new(25, BookletMode::Two);

    exam.keys = extract_keys(&document, &exam);
    assert_eq!(exam.keys.get(Variant::A), Some(KEY_A));
    assert_eq!(exam.keys.get(Variant::B), Some(KEY_B));

    let batch = extract_records(&document, &exam);
    assert_eq!(batch.records.len(), 3);
    assert_eq!(batch.misses.get(&ExtractionMiss::NoAnswerCell), Some(&1));

    let totals: Vec<f64> = batch.records.iter().map(|r| score(r, &exam).total()).collect();
    // 第二名学生按 B 卷判分；第三名只作答了前 10 题
    assert_eq!(totals, vec![100.0, 100.0, 40.0]);
    assert_eq!(batch.records[1].booklet_variant, Some(Variant::B));
}

#[test]
fn test_no_marker_scores_zero() {
    let text = results_text().replace("Cevap Anahtari", "Notlar");
    let document = reader().from_text(&text);
    let mut exam = ExamConfig::new(25, BookletMode::Two);

    exam.keys = extract_keys(&document, &exam);
    assert!(exam.keys.is_empty());

    let batch = extract_records(&document, &exam);
    for record in &batch.records {
        assert_eq!(score(record, &exam), ScoreList::zeros(25));
    }
}

#[test]
fn test_single_booklet_ignores_printed_variant() {
    let document = reader().from_text(&results_text());
    let mut exam = ExamConfig::new(25, BookletMode::Single).with_points(PointsMode::Fixed(4.0));
    exam.keys.insert(Variant::A, KEY_A);

    let batch = extract_records(&document, &exam);
    let ayse = &batch.records[0];
    assert_eq!(ayse.name, "Ayse Yilmaz");
    assert_eq!(score(ayse, &exam).total(), 100.0);
}

#[test]
fn test_exam_config_from_toml() {
    let exam = parse_exam_config(
        r#"
question_count = 20
booklet_mode = "four"
fallback_variant = "C"

[keys]
D = "abcd abcd abcd abcd abcd"
"#,
    )
    .unwrap();

    exam.validate().unwrap();
    assert_eq!(exam.active_variants().len(), 4);
    assert_eq!(exam.keys.get(Variant::D), Some("ABCDABCDABCDABCDABCD"));
    assert_eq!(exam.points_per_question(), 5.0);
    assert_eq!(exam.rules.min_row_cells, 3);
}

#[test]
fn test_app_run_writes_archive() {
    let dir = scratch_dir("run");
    let document = dir.join("sinav.txt");
    std::fs::write(&document, results_text()).unwrap();

    let summary = tokio_test::block_on(async {
        let app = App::initialize(test_config(&dir)).await.unwrap();
        app.run(GradeRequest {
            document: document.clone(),
            exam: ExamConfig::new(25, BookletMode::Two),
            source: SourceKind::Auto,
        })
        .await
        .unwrap()
    });

    assert_eq!(summary.failed, 0);
    let names: Vec<&str> = summary.results.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Ayse Yilmaz", "Mehmet Demir", "Ali Veli"]);
    assert_eq!(summary.results[2].total, 40.0);
    // 表头行被跳过
    assert_eq!(summary.warnings, 1);

    let file = std::fs::File::open(&summary.archive).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    assert_eq!(archive.len(), 4);
    let mut svg = String::new();
    archive
        .by_name("Ayse_Yilmaz.svg")
        .unwrap()
        .read_to_string(&mut svg)
        .unwrap();
    assert!(svg.contains("TOTAL: 100"));
    assert!(archive.by_name("summary.json").is_ok());

    let warnings = std::fs::read_to_string(dir.join("warn.txt")).unwrap();
    assert!(warnings.contains("跳过 1 行"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn test_zero_concurrency_still_grades() {
    let dir = scratch_dir("zero_concurrency");
    let document = dir.join("sinav.txt");
    std::fs::write(&document, results_text()).unwrap();

    let config = Config {
        max_concurrent_students: 0,
        ..test_config(&dir)
    };
    let app = App::initialize(config).await.unwrap();
    let summary = app
        .run(GradeRequest {
            document,
            exam: ExamConfig::new(25, BookletMode::Two),
            source: SourceKind::Auto,
        })
        .await
        .unwrap();

    assert_eq!(summary.results.len(), 3);
    assert_eq!(summary.failed, 0);
    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn test_manual_source_requires_all_keys() {
    let dir = scratch_dir("manual");
    let app = App::initialize(test_config(&dir)).await.unwrap();

    let mut exam = ExamConfig::new(25, BookletMode::Two);
    exam.keys.insert(Variant::A, KEY_A);

    let err = app
        .run(GradeRequest {
            document: dir.join("missing.pdf"),
            exam,
            source: SourceKind::Manual,
        })
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<AppError>(),
        Some(AppError::Config(ConfigError::MissingKeys { .. }))
    ));
    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn test_question_count_out_of_range() {
    let dir = scratch_dir("range");
    let app = App::initialize(test_config(&dir)).await.unwrap();

    let err = app
        .run(GradeRequest {
            document: dir.join("sinav.txt"),
            exam: ExamConfig::new(150, BookletMode::Two),
            source: SourceKind::Auto,
        })
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<AppError>(),
        Some(AppError::Config(ConfigError::QuestionCountOutOfRange { count: 150, .. }))
    ));
    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn test_empty_document_halts() {
    let dir = scratch_dir("empty");
    let document = dir.join("empty.txt");
    std::fs::write(&document, "   \n\n\x0c\n").unwrap();
    let app = App::initialize(test_config(&dir)).await.unwrap();

    let err = app
        .run(GradeRequest {
            document,
            exam: ExamConfig::default(),
            source: SourceKind::Auto,
        })
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<DocumentError>(),
        Some(DocumentError::Empty { .. })
    ));
    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn test_document_without_students_halts() {
    let dir = scratch_dir("nostudents");
    let document = dir.join("keys_only.txt");
    std::fs::write(&document, format!("Answer key A: {}\n", KEY_A)).unwrap();
    let app = App::initialize(test_config(&dir)).await.unwrap();

    let request = GradeRequest {
        document,
        exam: ExamConfig::new(25, BookletMode::Single),
        source: SourceKind::Auto,
    };

    // extract 不要求有学生记录
    let prepared = app.extract(&request).await.unwrap();
    assert_eq!(prepared.exam.keys.get(Variant::A), Some(KEY_A));

    let err = app.run(request).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<DocumentError>(),
        Some(DocumentError::NoRecords { .. })
    ));
    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn test_assisted_source_requires_api_key() {
    let dir = scratch_dir("assisted");
    let app = App::initialize(test_config(&dir)).await.unwrap();

    let err = app
        .run(GradeRequest {
            document: dir.join("sinav.txt"),
            exam: ExamConfig::default(),
            source: SourceKind::Assisted,
        })
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<AppError>(),
        Some(AppError::Config(ConfigError::MissingApiKey { .. }))
    ));
    let _ = std::fs::remove_dir_all(&dir);
}
