//! End-to-end runs through the public API: raw CSV bytes in, dashboard
//! structures out.

use schoolboard::models::column::{categories, ETHNICITY};
use schoolboard::models::{K8Tab, PageTab, SchoolType, TypeTab};
use schoolboard::transform::TableCell;
use schoolboard::{
    analysis_chart, compare_percentages, parse_bytes_auto, table, InputFormat, OutputStatus, Record,
    SelectionContext, Subject, Value,
};
use serde_json::json;

const SCHOOL_CSV: &str = "\
Year,School ID,School Name,Total|ELA Total Proficient,Total|ELA Total Tested,Black|ELA Total Proficient,Black|ELA Total Tested
2022,1088,Elm,12,40,***,9
2023,1088,Elm,10,40,4,16
";

fn selection() -> SelectionContext {
    SelectionContext {
        school_id: "1088".into(),
        school_type: Some(SchoolType::K8),
        page_tab: Some(PageTab::Info),
        type_tab: Some(TypeTab::K8),
        k8_tab: Some(K8Tab::Ilearn),
        ..SelectionContext::default()
    }
}

fn cats(list: &[&str]) -> Vec<String> {
    list.iter().map(|c| c.to_string()).collect()
}

#[test]
fn csv_to_info_table() {
    let parsed = parse_bytes_auto(SCHOOL_CSV.as_bytes()).unwrap();
    assert_eq!(parsed.format, InputFormat::Csv);
    assert_eq!(parsed.delimiter, Some(','));
    assert_eq!(parsed.records[0].get("Black|ELA Total Proficient"), &Value::Suppressed);

    let output = table(&parsed.records, &cats(&["Total", "Black"]), Subject::Ela, &selection()).unwrap();

    assert_eq!(output.status, OutputStatus::Ready);
    assert_eq!(output.table.columns, cats(&["2022", "2023"]));

    let total = output.table.row("Total").unwrap();
    assert_eq!(total.ratio("2022"), Some(0.3));
    assert_eq!(
        total.cells["2023"],
        TableCell::Ratio {
            ratio: 0.25,
            sample_size: 40
        }
    );

    let black = output.table.row("Black").unwrap();
    assert_eq!(black.cells["2022"], TableCell::Suppressed);
    assert_eq!(black.ratio("2023"), Some(0.25));
    assert_eq!(output.table.notes.insufficient["Black"], cats(&["2022"]));
}

#[test]
fn json_to_analysis_chart() {
    let body = json!([
        {"School ID": 1088, "School Name": "Elm", "Year": 2023,
         "Black|ELA Proficient %": 0.41, "Asian|ELA Proficient %": "***"},
        {"School ID": 3, "School Name": "Oak", "Year": 2023,
         "Black|ELA Proficient %": 0.38, "Asian|ELA Proficient %": 0.7}
    ]);
    let parsed = parse_bytes_auto(body.to_string().as_bytes()).unwrap();
    assert_eq!(parsed.format, InputFormat::Json);

    let chart = analysis_chart(
        &parsed.records,
        &categories(&ETHNICITY),
        Subject::Ela,
        &SelectionContext {
            year: Some(2023),
            ..selection()
        },
    )
    .unwrap();

    assert_eq!(chart.status, OutputStatus::Ready);
    assert_eq!(chart.columns, cats(&["Black"]));
    assert!(chart.missing.contains(&"Asian".to_string()));
    assert!(chart.records.iter().all(|r| !r.contains("Asian")));

    let json = serde_json::to_value(&chart).unwrap();
    assert_eq!(json["records"][1]["School Name"], "Oak");
    assert_eq!(json["records"][1]["Black"], 0.38);
}

#[test]
fn enrollment_shares_serialize_with_note() {
    let school = Record::new()
        .with("School Name", "Elm")
        .with("Asian", 0.0)
        .with("Black", 100.0)
        .with("White", 300.0)
        .with("Total Enrollment", 400.0);
    let district = Record::new()
        .with("Asian", 200.0)
        .with("Black", 1800.0)
        .with("White", 8000.0)
        .with("Total Enrollment", 10000.0);

    let output = compare_percentages(&school, &district, &cats(&["Asian", "Black", "White"]), 0.0005);
    let json = serde_json::to_value(&output).unwrap();

    assert_eq!(json["status"], "ready");
    assert_eq!(json["note"], "Less than .05%: Asian.");
    assert_eq!(json["school"]["School Name"], "Elm");
    assert_eq!(json["school"]["Black"], 0.25);
    assert!(json["school"].get("Missing").is_none());
    assert!(json["comparison"].get("Asian").is_none());
    assert_eq!(json["comparison"]["White"], 0.8);
}
