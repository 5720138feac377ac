use chrono::NaiveDate;
use receipt_report_builder::*;
use serde_json::json;

const MARCH_RECEIPTS: &str = "\
ReceiptID,MemberCode,MemberName,BranchName,GovernrateName,Adddate,cancelled,printed,CancelledBy,CancelDate,_AdminExpenses,_اشتراك,_متأخرات,_NextYearCalculation,_رسوم معاش,_دمغة,_دمغه,_كارنيه,_غرامة
105,M-1,احمد,القاهرة,القاهرة,2025-03-01,0,1,,,0,100,0,0,20,5,0,0,0
101,M-2,منى,القاهرة,القاهرة,2025-03-02,0,1,,,15,200,50,0,0,0,5,30,0
103,M-3,سعيد,القاهرة,الجيزة,2025-03-03,1,0,admin,2025-03-03T12:00:00,0,80,0,0,0,0,0,0,0
104,M-4,هالة,القاهرة,القاهرة,2025-03-04,1,1,admin,2025-03-05T08:30:00,0,60,0,0,10,0,0,0,0
102,M-5,كريم,القاهرة,القاهرة,2025-03-05,0,1,,,0,0,0,300,0,2,3,0,0
";

fn table_from_csv(data: &str) -> anyhow::Result<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(data.as_bytes());
    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
    let records = reader.records().collect::<std::result::Result<Vec<_>, csv::Error>>()?;
    Ok(table_from_text_rows(
        &headers,
        records.iter().map(|r| r.iter().collect::<Vec<&str>>()),
    ))
}

fn march_config() -> ReportConfig {
    ReportConfig::new("النقابه العامه للعلاج الطبيعى", 2025).with_period(
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
        NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
    )
}

fn full_report(outcome: &ReportOutcome) -> &ReceiptReport {
    outcome.report().expect("expected a full report")
}

#[test]
fn test_monthly_report_end_to_end() -> anyhow::Result<()> {
    let table = table_from_csv(MARCH_RECEIPTS)?;
    let outcome = process_with_verification(table, &march_config(), 1e-6)?;
    let report = full_report(&outcome);

    let ids: Vec<&str> = report
        .rows
        .iter()
        .filter_map(|r| r.receipt_id.as_deref())
        .collect();
    assert_eq!(ids, vec!["101", "102", "103", "104", "105"]);

    let names: Vec<&str> = report
        .catalog
        .iter()
        .map(|e| e.display_name.as_str())
        .collect();
    assert_eq!(
        names,
        vec![
            "مصاريف ادارية",
            "اشتراك",
            "متأخرات",
            "اشتراك مقدم سنة2026",
            "رسوم معاش",
            "دمغة",
            "كارنيه"
        ],
        "zero-only service columns must be dropped"
    );

    assert_eq!(report.summary.active, StateTotals { count: 3, total: 730.0 });
    assert_eq!(
        report.summary.cancelled_before_print,
        StateTotals { count: 1, total: 80.0 }
    );
    assert_eq!(
        report.summary.cancelled_after_print,
        StateTotals { count: 1, total: 70.0 }
    );
    assert_eq!(report.summary.cash_total, 430.0);
    assert_eq!(report.summary.card_total, 300.0);

    let funds = report.summary.funds;
    assert_eq!(funds.base, 400.0);
    assert_eq!(funds.other, 10.0);
    assert_eq!(funds.pension, 20.0);
    assert_eq!(funds.union_fund, 210.0);
    assert_eq!(funds.pension_fund, 220.0);

    Ok(())
}

#[test]
fn test_monthly_report_rows() -> anyhow::Result<()> {
    let outcome = build_report(table_from_csv(MARCH_RECEIPTS)?, &march_config())?;
    let report = full_report(&outcome);

    let card = &report.rows[0];
    assert_eq!(card.channel(), Some(PaymentChannel::Card));
    assert_eq!(card.row_total, 300.0);
    assert_eq!(card.card_total, 300.0);
    assert_eq!(card.date, NaiveDate::from_ymd_opt(2025, 3, 2));
    assert_eq!(card.member_code.as_deref(), Some("M-2"));

    let cancelled = &report.rows[2];
    assert_eq!(cancelled.state(), CancellationState::CancelledBeforePrint);
    assert_eq!(cancelled.row_total, 80.0);
    assert_eq!(cancelled.cash_total + cancelled.card_total, 0.0);
    assert_eq!(
        cancelled.amount_in_words,
        "فقط ثمانون جنيه مصري لا غير (ملغى)"
    );
    assert_eq!(cancelled.cancelled_by.as_deref(), Some("admin"));
    assert_eq!(cancelled.cancelled_at.as_deref(), Some("03/03/2025 12:00"));

    let cash = &report.rows[4];
    assert_eq!(cash.row_total, 125.0);
    assert_eq!(
        cash.amount_in_words,
        "فقط مائة و خمسة و عشرون جنيه مصري لا غير"
    );
    assert_eq!(cash.cancelled_by, None);

    for row in report.rows.iter().filter(|r| r.is_active()) {
        assert_eq!(row.cash_total + row.card_total, row.row_total);
    }

    Ok(())
}

#[test]
fn test_monthly_report_layout_and_formulas() -> anyhow::Result<()> {
    let outcome = build_report(table_from_csv(MARCH_RECEIPTS)?, &march_config())?;
    let report = full_report(&outcome);

    assert_eq!(
        report.header.period_line,
        "كشف حركه المتحصلات النقديه عن الفتره من 01/03/2025 الى 31/03/2025"
    );
    assert_eq!(report.header.branch_line, "فرع/ القاهرة");

    let layout = report.layout;
    assert_eq!(layout.column_letter(ReportColumn::Total), "S");
    assert_eq!(layout.summary_row(), 12);

    let total = report.summary.column(ReportColumn::Total).unwrap();
    assert_eq!(total.formula.to_a1(), "SUMIFS(S6:S10, H6:H10, \"لا\")");
    assert_eq!(total.active_total, 730.0);

    let stamp = report.summary.column(ReportColumn::Service(5)).unwrap();
    assert_eq!(stamp.label, "دمغة");
    assert_eq!(stamp.active_total, 15.0);

    let cells = report.report_cells();
    let flag_cells: Vec<&ReportCell> = cells
        .iter()
        .filter(|c| c.has_annotation(CellAnnotation::CancelledFlag))
        .collect();
    assert_eq!(flag_cells.len(), 2);
    assert!(flag_cells
        .iter()
        .all(|c| c.content == CellContent::Text("نعم".to_string())));

    let formula_cells = cells
        .iter()
        .filter(|c| matches!(c.content, CellContent::Formula { .. }))
        .count();
    assert_eq!(formula_cells, 10);

    Ok(())
}

#[test]
fn test_raw_data_sheet_is_processed_table() -> anyhow::Result<()> {
    let outcome = build_report(table_from_csv(MARCH_RECEIPTS)?, &march_config())?;
    let report = full_report(&outcome);
    let raw = &report.raw_data;

    assert!(raw.contains_column("دمغة"));
    assert!(!raw.contains_column("_دمغة"));
    assert!(!raw.contains_column("_دمغه"));
    assert!(raw.contains_column("_غرامة"), "raw sheet keeps zero columns");
    assert!(raw.contains_column("_اشتراك مقدم سنة2026"));
    assert_eq!(raw.value(0, "رقم الايصال"), Some(&CellValue::Number(101.0)));
    assert_eq!(raw.value(1, "دمغة"), Some(&CellValue::Number(5.0)));

    Ok(())
}

#[test]
fn test_reference_year_drives_advance_columns() -> anyhow::Result<()> {
    let config = ReportConfig::new("Test", 2026);
    let outcome = build_report(table_from_csv(MARCH_RECEIPTS)?, &config)?;
    let report = full_report(&outcome);

    let advance = report
        .catalog
        .iter()
        .find(|e| e.column_name == "_اشتراك مقدم سنة2027")
        .expect("advance subscription column");
    assert_eq!(advance.category, ColumnCategory::Base);
    assert!(report.header.period_line.contains("__________________"));

    Ok(())
}

#[test]
fn test_empty_csv_gives_sentinel() -> anyhow::Result<()> {
    let table = table_from_csv("ReceiptID,_اشتراك\n")?;
    let outcome = build_report(table, &march_config())?;

    match outcome {
        ReportOutcome::Empty(empty) => {
            assert_eq!(empty.sheet_name, "NoData");
            assert_eq!(empty.message, "لا توجد بيانات للفترة المحددة.");
            assert_eq!(empty.file_name, "EmptyReport.xlsx");
        }
        ReportOutcome::Full(_) => panic!("expected the empty sentinel"),
    }

    Ok(())
}

#[test]
fn test_all_zero_service_columns_still_render() -> anyhow::Result<()> {
    let csv = "\
ReceiptID,cancelled,_اشتراك,_رسوم معاش
1,0,0,0
2,0,,0
";
    let outcome = process_with_verification(table_from_csv(csv)?, &march_config(), 1e-9)?;
    let report = full_report(&outcome);

    assert!(report.catalog.is_empty());
    assert_eq!(report.layout.column_number(ReportColumn::Total), 12);
    assert_eq!(report.summary.grand_total, 0.0);
    assert_eq!(report.summary.funds, FundTotals::default());
    assert_eq!(report.summary.columns.len(), 3);
    assert!(report.rows.iter().all(|r| r.amount_in_words == "فقط صفر جنيه مصري لا غير"));

    Ok(())
}

#[test]
fn test_json_records_report() -> anyhow::Result<()> {
    let records = vec![
        json!({
            "ReceiptID": 7,
            "BranchName": "الاسكندرية",
            "Adddate": "2025-05-10T10:00:00",
            "cancelled": false,
            "printed": true,
            "_AdminExpenses": null,
            "_اشتراك": 150.50,
            "_رسوم\nقيد": "25"
        }),
        json!({
            "ReceiptID": 3,
            "BranchName": "الاسكندرية",
            "cancelled": true,
            "printed": true,
            "CancelledBy": "supervisor",
            "_اشتراك": 40
        }),
    ];

    let table = table_from_records(&records)?;
    let outcome = process_with_verification(table, &ReportConfig::new("Test", 2025), 1e-6)?;
    let report = full_report(&outcome);

    assert_eq!(report.rows[0].receipt_id.as_deref(), Some("3"));
    assert_eq!(report.rows[0].state(), CancellationState::CancelledAfterPrint);
    assert_eq!(report.rows[0].cancelled_by.as_deref(), Some("supervisor"));

    let active = &report.rows[1];
    assert_eq!(active.row_total, 175.50);
    assert_eq!(active.cash_total, 175.50);
    assert_eq!(
        active.amount_in_words,
        "فقط مائة و خمسة و سبعون و خمسون قرشاً جنيه مصري لا غير"
    );

    assert!(report.raw_data.contains_column("رسوم قيد"));
    assert!(!report.raw_data.contains_column("_رسوم قيد"));
    let fee = report
        .catalog
        .iter()
        .find(|e| e.column_name == "رسوم قيد")
        .expect("cleaned fee column merged into its group");
    assert_eq!(fee.category, ColumnCategory::Other);

    Ok(())
}

#[test]
fn test_invalid_record_is_rejected() {
    let records = vec![json!({"ReceiptID": 1}), json!("not a record")];
    assert!(matches!(
        table_from_records(&records),
        Err(ReportError::InvalidRecord { index: 1, .. })
    ));
}

#[test]
fn test_overlapping_synonym_groups_rejected() -> anyhow::Result<()> {
    let mut config = march_config();
    config
        .synonym_groups
        .push(SynonymGroup::new("طوابع", &["_دمغه"]));

    let result = build_report(table_from_csv(MARCH_RECEIPTS)?, &config);
    assert!(matches!(
        result,
        Err(ReportError::OverlappingSynonymSource { .. })
    ));

    Ok(())
}

#[test]
fn test_catalog_markdown_preview() -> anyhow::Result<()> {
    let outcome = build_report(table_from_csv(MARCH_RECEIPTS)?, &march_config())?;
    let markdown = full_report(&outcome).catalog.to_markdown();

    assert!(markdown.contains("## Base"));
    assert!(markdown.contains("2. اشتراك\n"));
    assert!(markdown.contains("5. رسوم معاش"));
    assert!(markdown.contains("6. دمغة ⚠️ **[UNMATCHED]**"));

    Ok(())
}
