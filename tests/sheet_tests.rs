// Sheet ingestion: parsing, header mapping and record extraction

mod common;

use chrono::Utc;
use common::{SHEET_HEADER, StaticSheetSource, sample_csv};
use dealerboard::error::ParseError;
use dealerboard::poller::refresh;
use dealerboard::sheet::{
    ColumnIndices, ColumnKey, extract_records, fetch_records, parse_rows, read_sheet,
    records_from_csv,
};

#[test]
fn maps_active_header_and_extracts_one_record() {
    let csv = "A-Dealers,A-Service,A-Zone,Active Users\nAcme,TES Gold,North,42";
    let rows = parse_rows(csv).rows;
    let indices = ColumnIndices::from_headers(&rows[0]);
    assert_eq!(indices.get(ColumnKey::ActiveDealer), Some(0));
    assert_eq!(indices.get(ColumnKey::ActiveService), Some(1));
    assert_eq!(indices.get(ColumnKey::ActiveZone), Some(2));
    assert_eq!(indices.get(ColumnKey::ActiveUsers), Some(3));
    assert_eq!(indices.get(ColumnKey::ExpiredDealer), None);

    let records = extract_records(&rows, &indices, Utc::now());
    assert_eq!(records.active.len(), 1);
    let r = &records.active[0];
    assert_eq!(r.dealer, "Acme");
    assert_eq!(r.service, "TES Gold");
    assert_eq!(r.zone, "North");
    assert_eq!(r.active_users, 42);
    assert!(records.expired.is_empty());
}

#[test]
fn zong_service_is_dropped() {
    let csv = format!("{SHEET_HEADER}\nZed,Zong Basic,North,9,Zed,Zong Basic,North,30");
    let records = records_from_csv(&csv, Utc::now());
    assert!(records.is_empty());
}

#[test]
fn zong_wins_over_inclusion_token() {
    let csv = format!("{SHEET_HEADER}\nZed,Zong TES,North,9,Zed,Zong TES,North,30");
    let records = records_from_csv(&csv, Utc::now());
    assert!(records.is_empty());
}

#[test]
fn header_mapping_is_idempotent() {
    let rows = parse_rows(&sample_csv()).rows;
    let first = ColumnIndices::from_headers(&rows[0]);
    let second = ColumnIndices::from_headers(&rows[0]);
    assert_eq!(first, second);
    assert_eq!(first.mapped_count(), 8);
}

#[test]
fn header_matching_is_case_insensitive_substring_and_first_wins() {
    let headers = [
        "Region",
        "my A-DEALERS list",
        "a-dealers (old)",
        "A-Service",
        "A-Zone",
        "Total Active Users",
    ];
    let indices = ColumnIndices::from_headers(&headers);
    assert_eq!(indices.get(ColumnKey::ActiveDealer), Some(1));
    assert_eq!(indices.get(ColumnKey::ActiveUsers), Some(5));
    assert!(indices.active_side().is_some());
    assert!(indices.expired_side().is_none());
}

#[test]
fn sample_sheet_extracts_both_sides() {
    let records = records_from_csv(&sample_csv(), Utc::now());
    let active: Vec<_> = records.active.iter().map(|r| r.dealer.as_str()).collect();
    let expired: Vec<_> = records.expired.iter().map(|r| r.dealer.as_str()).collect();
    assert_eq!(active, vec!["Acme", "Bravo", "Cargo"]);
    assert_eq!(expired, vec!["Acme", "Bravo", "Cargo"]);
    assert_eq!(records.expired[0].expired_users, 25);
    assert!(records.active.iter().all(|r| r.observed_at.is_some()));
}

#[test]
fn sides_are_filtered_independently() {
    let csv = format!("{SHEET_HEADER}\nAcme,TES Gold,North,4,,McSOL,South,7\nBeta,Other,East,3,Beta,McSOL x,East,11");
    let records = records_from_csv(&csv, Utc::now());
    assert_eq!(records.active.len(), 1);
    assert_eq!(records.active[0].dealer, "Acme");
    assert_eq!(records.expired.len(), 1);
    assert_eq!(records.expired[0].dealer, "Beta");
    assert_eq!(records.expired[0].expired_users, 11);
}

#[test]
fn short_rows_and_trailing_blank_lines_are_skipped() {
    let csv = format!("{SHEET_HEADER}\nAcme,TES Gold,North\nBeta,TES,East,1,Beta,TES,East,2\n\n");
    let records = records_from_csv(&csv, Utc::now());
    assert_eq!(records.active.len(), 1);
    assert_eq!(records.active[0].dealer, "Beta");
    assert_eq!(records.expired.len(), 1);
}

#[test]
fn non_numeric_count_becomes_zero() {
    let csv = format!("{SHEET_HEADER}\nAcme,TES,North,n/a,Acme,TES,North,");
    let records = records_from_csv(&csv, Utc::now());
    assert_eq!(records.active[0].active_users, 0);
    assert_eq!(records.expired[0].expired_users, 0);
}

#[test]
fn fields_are_trimmed_and_quoted_commas_kept() {
    let csv = format!("{SHEET_HEADER}\n\"Acme, Ltd\" , TES Gold ,  North ,5,x,y,z,0");
    let records = records_from_csv(&csv, Utc::now());
    assert_eq!(records.active[0].dealer, "Acme, Ltd");
    assert_eq!(records.active[0].service, "TES Gold");
    assert_eq!(records.active[0].zone, "North");
    assert!(records.expired.is_empty());
}

#[test]
fn empty_input_yields_one_degenerate_row_and_no_records() {
    let rows = parse_rows("").rows;
    assert_eq!(rows, vec![vec![String::new()]]);
    let records = records_from_csv("", Utc::now());
    assert!(records.is_empty());
}

#[test]
fn header_only_yields_no_records() {
    let records = records_from_csv(SHEET_HEADER, Utc::now());
    assert!(records.is_empty());
}

#[test]
fn escaped_quote_drops_only_that_row() {
    let csv = format!("{SHEET_HEADER}\n\"Acme \"\"Big\"\" Co\",TES,North,1,a,b,c,0\nBravo,TES,South,4,Bravo,TES,South,2");
    let read = read_sheet(&csv, Utc::now());
    assert_eq!(read.rejected, vec![ParseError::EscapedQuote { row: 2, column: 1 }]);
    assert_eq!(read.records.active.len(), 1);
    assert_eq!(read.records.active[0].dealer, "Bravo");
}

#[test]
fn escaped_quote_in_unmapped_notes_column_keeps_other_rows() {
    let csv = [
        &format!("{SHEET_HEADER},Notes"),
        "Acme,TES Gold,North,42,Acme,TES Gold,North,25,ok",
        r#"Cargo,TES,North,8,Cargo,TES,North,12,"said ""hi""""#,
        "Bravo,McSOL Basic,South,10,Bravo,McSOL Basic,South,5,",
    ]
    .join("\n");
    let read = read_sheet(&csv, Utc::now());
    assert_eq!(read.rejected, vec![ParseError::EscapedQuote { row: 3, column: 9 }]);
    let active: Vec<_> = read.records.active.iter().map(|r| r.dealer.as_str()).collect();
    let expired: Vec<_> = read.records.expired.iter().map(|r| r.dealer.as_str()).collect();
    assert_eq!(active, vec!["Acme", "Bravo"]);
    assert_eq!(expired, vec!["Acme", "Bravo"]);
}

#[test]
fn unreadable_header_yields_no_records() {
    let csv = "\"A-Dealers \"\"x\"\"\",A-Service,A-Zone,Active Users\nAcme,TES,North,1";
    let read = read_sheet(csv, Utc::now());
    assert!(read.records.is_empty());
    assert_eq!(read.rejected.len(), 1);
}

#[tokio::test]
async fn fetch_records_reads_from_source() {
    let source = StaticSheetSource::new(sample_csv());
    let read = fetch_records(&source).await.unwrap();
    assert_eq!(read.records.active.len(), 3);
    assert!(read.rejected.is_empty());
    assert_eq!(source.fetch_count(), 1);
}

#[tokio::test]
async fn refresh_counts_rejected_rows() {
    let csv = format!("{SHEET_HEADER}\nAcme,TES,North,3,Acme,TES,North,1\nx,\"b\"\"c\",y,1,x,b,y,1");
    let source = StaticSheetSource::new(csv);
    let live = refresh(&source).await.unwrap();
    assert_eq!(live.rejected_rows, 1);
    assert_eq!(live.records.active.len(), 1);
}
