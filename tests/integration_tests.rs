//! Integration tests for the expediente-pdf pipeline.
//!
//! These tests validate:
//! - Input validation rejects anything but a list of records
//! - Each record produces the expected sections and table sizes
//! - Layout config positions stay inside the page
//! - Pagination, forced breaks and table splitting
//! - PDF output exists and has valid format
//! - Real TTF faces are measured with their own metrics and embedded

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};

use expediente_pdf::blocks::{LayoutBlock, RenderedSection, SectionKind, Table};
use expediente_pdf::date::DateFormatter;
use expediente_pdf::layout_config::{LayoutConfig, PageMargins};
use expediente_pdf::pipeline::{compute_layout_config_on, convert, generate_pdf_on, PipelineConfig};
use expediente_pdf::record::validate_payload;
use expediente_pdf::render::render_pdf;
use expediente_pdf::report::{flatten, RecordRenderer};
use expediente_pdf::resources::{BOLD_FONT_FILE, REGULAR_FONT_FILE, REPORT_FAMILY};
use expediente_pdf::samples;
use expediente_pdf::{Error, ReportResources};

// =====================================================================
// Helpers
// =====================================================================

fn default_config() -> PipelineConfig {
    PipelineConfig::default()
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 17).unwrap()
}

fn assert_valid_pdf(bytes: &[u8]) {
    assert!(bytes.len() > 100, "PDF too small: {} bytes", bytes.len());
    assert_eq!(&bytes[0..5], b"%PDF-", "Missing PDF header");
}

fn layout(payload: &Value) -> LayoutConfig {
    compute_layout_config_on(payload, date(), &ReportResources::builtin(), &default_config())
        .unwrap()
}

fn sections_of(record: Value) -> Vec<RenderedSection> {
    let res = ReportResources::builtin();
    let records = validate_payload(&json!([record])).unwrap();
    let renderer = RecordRenderer::new(&res.styles, date(), &DateFormatter::spanish());
    renderer.render(&records[0])
}

fn kinds(sections: &[RenderedSection]) -> Vec<SectionKind> {
    sections.iter().map(|s| s.kind).collect()
}

fn section_tables(sections: &[RenderedSection], kind: SectionKind) -> Vec<Table> {
    sections
        .iter()
        .filter(|s| s.kind == kind)
        .flat_map(|s| s.tables().cloned())
        .collect()
}

fn layout_fingerprint(config: &LayoutConfig) -> String {
    let digest = Sha256::digest(config.to_json().as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

// =====================================================================
// Input validation
// =====================================================================

#[test]
fn non_list_payloads_fail_without_output() {
    let res = ReportResources::builtin();
    for payload in [json!({"expedientName": "x"}), json!("x"), json!(3), Value::Null] {
        let result = convert(&payload, &res, &default_config());
        assert!(
            matches!(result, Err(Error::Validation(_))),
            "payload {payload} was not rejected"
        );
    }
}

#[test]
fn non_object_entry_is_rejected() {
    let res = ReportResources::builtin();
    let result = convert(&json!([{}, 5]), &res, &default_config());
    match result {
        Err(Error::Validation(msg)) => assert!(msg.contains("record 1"), "{msg}"),
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn empty_list_gives_a_valid_document() {
    let res = ReportResources::builtin();
    let (bytes, config) = generate_pdf_on(&json!([]), date(), &res, &default_config()).unwrap();
    assert_valid_pdf(&bytes);
    assert_eq!(config.pages.len(), 1);
    assert!(config.pages[0].boxes.is_empty());
}

// =====================================================================
// Section structure
// =====================================================================

#[test]
fn bare_record_has_only_fixed_sections() {
    let sections = sections_of(samples::minimal_record());
    assert_eq!(
        kinds(&sections),
        [
            SectionKind::DateBanner,
            SectionKind::Title,
            SectionKind::Separator,
            SectionKind::InfoBar,
            SectionKind::Summary,
            SectionKind::PageBreak,
        ]
    );
}

#[test]
fn empty_and_absent_collections_are_equivalent() {
    let absent = sections_of(json!({"expedientName": "A"}));
    let empty = sections_of(json!({
        "expedientName": "A",
        "intervinientes": [],
        "datosEconomicos": [],
        "actuaciones": [],
        "recobros": []
    }));
    assert_eq!(absent, empty);
}

#[test]
fn tables_have_one_header_plus_one_row_per_item() {
    let row = json!({});
    let sections = sections_of(json!({
        "intervinientes": vec![row.clone(); 3],
        "datosEconomicos": vec![row.clone(); 2],
        "actuaciones": vec![row.clone(); 4],
        "recobros": vec![row; 1]
    }));

    let expect = [
        (SectionKind::Participants, 3),
        (SectionKind::FinancialData, 2),
        (SectionKind::Actions, 4),
    ];
    for (kind, n) in expect {
        let tables = section_tables(&sections, kind);
        assert_eq!(tables.len(), 1, "{kind:?}");
        assert_eq!(tables[0].rows.len(), n + 1, "{kind:?}");
        assert_eq!(tables[0].body_rows().len(), n, "{kind:?}");
    }

    // Balance: the figures strip, then the ledger.
    let balance = section_tables(&sections, SectionKind::Balance);
    assert_eq!(balance.len(), 2);
    assert_eq!(balance[1].rows.len(), 2);
}

#[test]
fn balance_strip_reads_record_scalars() {
    let defaults = sections_of(json!({
        "recobros": [{"Saldo": "999,99", "Haber": "1,00"}]
    }));
    let strip = &section_tables(&defaults, SectionKind::Balance)[0];
    let texts: Vec<String> = strip.rows[0].iter().map(|p| p.plain_text()).collect();
    assert_eq!(texts, ["Cuantía\n0.00", "Intereses\n0.00", "Saldo\n0.00"]);

    let filled = sections_of(samples::full_record());
    let strip = &section_tables(&filled, SectionKind::Balance)[0];
    let texts: Vec<String> = strip.rows[0].iter().map(|p| p.plain_text()).collect();
    assert_eq!(
        texts,
        ["Cuantía\n18.450,00", "Intereses\n1.203,75", "Saldo\n15.653,75"]
    );
}

#[test]
fn non_string_values_are_rendered_as_text() {
    let sections = sections_of(samples::full_record());
    let financial = &section_tables(&sections, SectionKind::FinancialData)[0];
    assert_eq!(financial.rows[2][3].plain_text(), "1203.75");

    let actions = &section_tables(&sections, SectionKind::Actions)[0];
    assert_eq!(actions.rows[1][4].plain_text(), "True");
    assert_eq!(actions.rows[2][5].plain_text(), "");
}

#[test]
fn two_record_batch_shares_date_and_breaks_in_order() {
    let res = ReportResources::builtin();
    let payload = samples::batch(&[samples::minimal_record(), samples::full_record()]);
    let records = validate_payload(&payload).unwrap();
    let renderer = RecordRenderer::new(&res.styles, date(), &DateFormatter::spanish());
    let sections = renderer.render_all(&records, true);

    let banners: Vec<String> = sections
        .iter()
        .filter(|s| s.kind == SectionKind::DateBanner)
        .filter_map(|s| s.blocks[0].as_paragraph().map(|p| p.plain_text()))
        .collect();
    assert_eq!(banners.len(), 2);
    assert_eq!(banners[0], banners[1]);
    assert_eq!(banners[0], "Día 17 de mayo de 2024");

    let blocks = flatten(sections);
    let breaks: Vec<usize> = blocks
        .iter()
        .enumerate()
        .filter(|(_, b)| matches!(b, LayoutBlock::PageBreak))
        .map(|(i, _)| i)
        .collect();
    assert_eq!(breaks.len(), 2);
    assert_eq!(*breaks.last().unwrap(), blocks.len() - 1);

    let config = layout(&payload);
    assert_eq!(config.pages.len(), 3);
    let texts = config.page_texts();
    assert_eq!(texts[0][0], texts[1][0]);
    assert!(texts[2].is_empty());
}

// =====================================================================
// Layout and pagination
// =====================================================================

#[test]
fn layout_positions_are_within_page() {
    let config = layout(&json!([samples::full_record()]));
    let page_w = config.page_width_pt;
    let page_h = config.page_height_pt;

    for page in &config.pages {
        for lbox in &page.boxes {
            lbox.visit(&mut |b| {
                assert!(b.x >= 0.0 && b.x + b.width <= page_w + 0.01, "x={} w={}", b.x, b.width);
                assert!(b.y >= 0.0 && b.y + b.height <= page_h + 0.01, "y={} h={}", b.y, b.height);
                assert!(b.width >= 0.0 && b.height >= 0.0);
            });
        }
    }
}

#[test]
fn data_tables_are_centered_in_the_frame() {
    let config = layout(&json!([samples::full_record()]));
    let m = PageMargins::REPORT;
    let frame = m.frame_width(config.page_width_pt);
    let expected_x = m.left + (frame - 540.0) / 2.0;

    let rows: Vec<_> = config.pages[0]
        .boxes
        .iter()
        .filter(|b| (b.width - 540.0).abs() < 0.01 && !b.children.is_empty())
        .collect();
    assert!(!rows.is_empty());
    for row in rows {
        assert!((row.x - expected_x).abs() < 0.01, "row x = {}", row.x);
    }
}

#[test]
fn one_record_document_has_trailing_blank_page() {
    let config = layout(&json!([samples::minimal_record()]));
    assert_eq!(config.pages.len(), 2);
    assert!(!config.pages[0].boxes.is_empty());
    assert!(config.pages[1].boxes.is_empty());
}

#[test]
fn trailing_break_can_be_dropped() {
    let config = PipelineConfig {
        trailing_page_break: false,
        ..default_config()
    };
    let layout = compute_layout_config_on(
        &json!([samples::minimal_record()]),
        date(),
        &ReportResources::builtin(),
        &config,
    )
    .unwrap();
    assert_eq!(layout.pages.len(), 1);
}

#[test]
fn long_action_log_splits_between_rows() {
    let config = layout(&json!([samples::long_actions_record(150)]));
    // content spans several pages, then the trailing blank page
    assert!(config.pages.len() >= 4, "got {} pages", config.pages.len());
    assert!(config.pages.last().unwrap().boxes.is_empty());

    let subjects: Vec<String> = config
        .page_texts()
        .concat()
        .into_iter()
        .filter(|t| t.starts_with("Actuación "))
        .collect();
    let expected: Vec<String> = (0..150).map(|i| format!("Actuación {i}")).collect();
    assert_eq!(subjects, expected);

    let bottom = config.page_height_pt - PageMargins::REPORT.bottom;
    for page in &config.pages {
        for lbox in &page.boxes {
            assert!(lbox.y + lbox.height <= bottom + 0.01);
        }
    }
}

#[test]
fn invalid_margins_are_render_errors() {
    let res = ReportResources::builtin();
    for margins in [
        PageMargins {
            top: 500.0,
            bottom: 400.0,
            ..PageMargins::REPORT
        },
        PageMargins {
            left: -1.0,
            ..PageMargins::REPORT
        },
    ] {
        let config = PipelineConfig {
            margins,
            ..default_config()
        };
        let result = generate_pdf_on(&json!([{}]), date(), &res, &config);
        assert!(matches!(result, Err(Error::Render(_))), "{margins:?}");
    }
}

// =====================================================================
// PDF generation
// =====================================================================

#[test]
fn generate_pdf_from_full_record() {
    let res = ReportResources::builtin();
    let payload = json!([samples::full_record()]);
    let (bytes, config) = generate_pdf_on(&payload, date(), &res, &default_config()).unwrap();
    assert_valid_pdf(&bytes);
    assert_eq!(config.pages.len(), 2);

    let text = config.page_texts()[0].join("\n");
    for needle in [
        "Reclamación de cantidad 112/2024",
        "Resumen del expediente",
        "Intervinientes",
        "Datos económicos",
        "Actuaciones",
        "Construcciones Arlanza S.L.",
        "Pago parcial",
    ] {
        assert!(text.contains(needle), "missing {needle:?}");
    }
}

#[test]
fn convert_returns_rewound_buffer() {
    let res = ReportResources::builtin();
    let cursor = convert(&json!([samples::minimal_record()]), &res, &default_config()).unwrap();
    assert_eq!(cursor.position(), 0);
    assert_valid_pdf(cursor.get_ref());
}

// =====================================================================
// Layout config JSON round-trip
// =====================================================================

#[test]
fn layout_config_json_roundtrip_rerenders() {
    let config = layout(&json!([samples::full_record()]));
    let parsed = LayoutConfig::from_json(&config.to_json()).unwrap();
    assert_eq!(parsed.pages.len(), config.pages.len());
    assert_eq!(parsed.page_texts(), config.page_texts());
    assert!((parsed.page_width_pt - config.page_width_pt).abs() < 0.01);

    let bytes = render_pdf(&parsed, &ReportResources::builtin().fonts).unwrap();
    assert_valid_pdf(&bytes);
}

// =====================================================================
// Idempotence
// =====================================================================

#[test]
fn same_payload_gives_same_layout() {
    let payload = samples::batch(&[samples::full_record(), samples::minimal_record()]);
    let first = layout(&payload);
    let second = layout(&payload);
    assert_eq!(first.page_texts(), second.page_texts());
    assert_eq!(layout_fingerprint(&first), layout_fingerprint(&second));
}

#[test]
fn pdf_output_is_stable_in_size() {
    let res = ReportResources::builtin();
    let payload = json!([samples::full_record()]);
    let (bytes1, _) = generate_pdf_on(&payload, date(), &res, &default_config()).unwrap();
    let (bytes2, _) = generate_pdf_on(&payload, date(), &res, &default_config()).unwrap();

    // printpdf embeds timestamps, so byte-exact equality isn't guaranteed.
    let diff = (bytes1.len() as i64 - bytes2.len() as i64).unsigned_abs();
    assert!(
        diff < 200,
        "PDF outputs differ significantly: {} vs {} bytes",
        bytes1.len(),
        bytes2.len()
    );
}

// =====================================================================
// Embedded fonts
// =====================================================================

const FIXTURE_FAMILY: &str = "DejaVu Sans";

fn fixture_font(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/fonts")
        .join(name)
}

fn fixture_resources() -> ReportResources {
    ReportResources::from_font_files(
        FIXTURE_FAMILY,
        &fixture_font("DejaVuSans.ttf"),
        &fixture_font("DejaVuSans-Bold.ttf"),
    )
    .unwrap()
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

#[test]
fn real_faces_use_glyph_advances() {
    let res = fixture_resources();
    assert_eq!(res.fonts.family(), FIXTURE_FAMILY);
    assert_eq!(res.styles.normal.font_family, FIXTURE_FAMILY);

    // The 0.5 em heuristic gives both strings the same width.
    let narrow = res.fonts.measure_text_width("iiiiii", 10.0, false, FIXTURE_FAMILY);
    let wide = res.fonts.measure_text_width("MMMMMM", 10.0, false, FIXTURE_FAMILY);
    assert!(wide > 2.0 * narrow, "{wide} vs {narrow}");

    let regular = res.fonts.measure_text_width("Saldo", 10.0, false, FIXTURE_FAMILY);
    let bold = res.fonts.measure_text_width("Saldo", 10.0, true, FIXTURE_FAMILY);
    assert!(bold > regular);
}

#[test]
fn full_record_embeds_real_fonts() {
    let res = fixture_resources();
    let (bytes, layout) =
        generate_pdf_on(&json!([samples::full_record()]), date(), &res, &default_config()).unwrap();
    assert_valid_pdf(&bytes);
    assert!(contains(&bytes, b"FontFile"), "no embedded font program");

    assert!(layout.pages.len() >= 2);
    assert!(layout.pages.last().unwrap().boxes.is_empty());
    let text = layout.page_texts().concat().join("\n");
    assert!(text.contains("Construcciones Arlanza S.L."));
}

#[test]
fn font_dir_loads_report_family() {
    let dir = std::env::temp_dir().join(format!("expediente-fonts-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    fs::copy(fixture_font("DejaVuSans.ttf"), dir.join(REGULAR_FONT_FILE)).unwrap();
    fs::copy(fixture_font("DejaVuSans-Bold.ttf"), dir.join(BOLD_FONT_FILE)).unwrap();

    let res = ReportResources::from_font_dir(&dir);
    fs::remove_dir_all(&dir).ok();

    let res = res.unwrap();
    assert_eq!(res.fonts.family(), REPORT_FAMILY);
    assert_eq!(res.styles.title.font_family, REPORT_FAMILY);
    let bytes = convert(&json!([samples::minimal_record()]), &res, &default_config()).unwrap();
    assert!(contains(bytes.get_ref(), b"FontFile"));
}
