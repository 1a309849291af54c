//! Block builders, one per report section.
//!
//! Every builder reads the typed record and the shared style sheet and
//! returns the section's blocks. Optional sections return `None` when
//! their collection is absent or empty.

use crate::blocks::{
    HorizontalRule, LayoutBlock, Paragraph, RenderedSection, SectionKind, Table, TextRun,
};
use crate::record::{cell, ExpedienteRecord};
use crate::style::{
    Color, Padding, RuleStyle, StyleSheet, TableAlign, TableStyle, TextAlign, CONTENT_WIDTH_PT,
    GRID_GRAY, HEADING_GRAY, INCH, NAVY, PANEL_TINT,
};

const SMALL_GAP: f32 = 0.1 * INCH;
const TITLE_GAP: f32 = 0.2 * INCH;

/// Separator between the two values sharing a summary line.
const PAIR_SEPARATOR: &str = "  -  ";

fn columns(ratios: &[f32]) -> Vec<f32> {
    ratios.iter().map(|r| CONTENT_WIDTH_PT * r).collect()
}

/// Spacer, bold section heading, spacer.
fn heading(text: &str, styles: &StyleSheet) -> Vec<LayoutBlock> {
    vec![
        LayoutBlock::spacer(SMALL_GAP),
        LayoutBlock::Paragraph(Paragraph::text(text, &styles.section_heading)),
        LayoutBlock::spacer(SMALL_GAP),
    ]
}

/// A data table: navy header strings, then one row of plain cells per item.
fn data_table<'r>(
    headers: &[&str],
    ratios: &[f32],
    rows: impl Iterator<Item = Vec<&'r str>>,
    styles: &StyleSheet,
) -> Table {
    let mut table_rows = vec![headers
        .iter()
        .map(|h| Paragraph::text(*h, &styles.header_cell))
        .collect::<Vec<_>>()];
    table_rows.extend(rows.map(|values| {
        values
            .into_iter()
            .map(|v| Paragraph::text(v, &styles.normal))
            .collect()
    }));
    Table::new(columns(ratios), table_rows, TableStyle::data_table())
}

pub fn date_banner(banner: &[TextRun], styles: &StyleSheet) -> RenderedSection {
    RenderedSection::new(
        SectionKind::DateBanner,
        vec![LayoutBlock::Paragraph(Paragraph::new(
            banner.to_vec(),
            &styles.info,
        ))],
    )
}

pub fn title(record: &ExpedienteRecord, styles: &StyleSheet) -> RenderedSection {
    RenderedSection::new(
        SectionKind::Title,
        vec![LayoutBlock::Paragraph(Paragraph::text(
            record.title(),
            &styles.title,
        ))],
    )
}

pub fn separator() -> RenderedSection {
    RenderedSection::new(
        SectionKind::Separator,
        vec![
            LayoutBlock::spacer(TITLE_GAP),
            LayoutBlock::Rule(HorizontalRule {
                thickness: 1.0,
                color: Color::BLACK,
                width_fraction: 1.0,
            }),
            LayoutBlock::spacer(TITLE_GAP),
        ],
    )
}

/// "Modificado por" / "Última actualización" / "Situación" on one row.
pub fn info_bar(record: &ExpedienteRecord, styles: &StyleSheet) -> RenderedSection {
    let row = vec![
        Paragraph::labelled("Modificado por:", record.modified_by(), &styles.normal),
        Paragraph::labelled(
            "Última actualización:",
            record.modified_date(),
            &styles.normal,
        ),
        Paragraph::labelled("Situación:", record.situation(), &styles.normal),
    ];
    let style = TableStyle {
        column_align: vec![TextAlign::Left, TextAlign::Right, TextAlign::Right],
        ..TableStyle::plain()
    };
    let table = Table::new(columns(&[0.5, 0.3, 0.2]), vec![row], style);
    RenderedSection::new(SectionKind::InfoBar, vec![LayoutBlock::Table(table)])
}

fn pair_line(
    (label_a, value_a): (&str, &str),
    (label_b, value_b): (&str, &str),
    styles: &StyleSheet,
) -> Paragraph {
    Paragraph::new(
        vec![
            TextRun::bold(label_a),
            TextRun::plain(format!(" {value_a}{PAIR_SEPARATOR}")),
            TextRun::bold(label_b),
            TextRun::plain(format!(" {value_b}")),
        ],
        &styles.normal,
    )
}

/// Shaded panel with the parties and court of the case.
pub fn summary(record: &ExpedienteRecord, styles: &StyleSheet) -> RenderedSection {
    let rows = vec![
        vec![Paragraph::labelled("Titular:", record.titular(), &styles.normal)],
        vec![Paragraph::labelled(
            "Responsable:",
            record.responsable(),
            &styles.normal,
        )],
        vec![pair_line(
            ("Cliente:", record.cliente()),
            ("Contrario:", record.contrario()),
            styles,
        )],
        vec![pair_line(
            ("Órgano:", record.organo()),
            ("Nº Autos:", record.num_autos()),
            styles,
        )],
    ];
    let style = TableStyle {
        padding: Padding::symmetric(3.0, 10.0),
        background: Some(PANEL_TINT),
        ..TableStyle::default()
    };

    let mut blocks = heading("Resumen del expediente", styles);
    blocks.push(LayoutBlock::Table(Table::new(
        vec![CONTENT_WIDTH_PT],
        rows,
        style,
    )));
    RenderedSection::new(SectionKind::Summary, blocks)
}

pub fn participants(record: &ExpedienteRecord, styles: &StyleSheet) -> Option<RenderedSection> {
    let items = record.intervinientes();
    if items.is_empty() {
        return None;
    }
    let table = data_table(
        &["Tipo", "Nombre", "Nº Identificación", "Teléfono"],
        &[0.2, 0.3998, 0.2, 0.2],
        items.iter().map(|i| {
            vec![
                cell(&i.tipo),
                cell(&i.nombre),
                cell(&i.identificacion),
                cell(&i.telefono),
            ]
        }),
        styles,
    );
    let mut blocks = heading("Intervinientes", styles);
    blocks.push(LayoutBlock::Table(table));
    Some(RenderedSection::new(SectionKind::Participants, blocks))
}

pub fn financial_data(record: &ExpedienteRecord, styles: &StyleSheet) -> Option<RenderedSection> {
    let items = record.datos_economicos();
    if items.is_empty() {
        return None;
    }
    let table = data_table(
        &["Tipo", "Fecha", "Descripción", "Importe"],
        &[0.2, 0.2, 0.3998, 0.2],
        items.iter().map(|d| {
            vec![
                cell(&d.tipo),
                cell(&d.fecha),
                cell(&d.descripcion),
                cell(&d.importe),
            ]
        }),
        styles,
    );
    let mut blocks = heading("Datos económicos", styles);
    blocks.push(LayoutBlock::Table(table));
    Some(RenderedSection::new(SectionKind::FinancialData, blocks))
}

pub fn actions(record: &ExpedienteRecord, styles: &StyleSheet) -> Option<RenderedSection> {
    let items = record.actuaciones();
    if items.is_empty() {
        return None;
    }
    let table = data_table(
        &[
            "Fecha",
            "Asunto",
            "Responsable",
            "Etapa",
            "Facturable",
            "Importe",
            "Duración",
        ],
        &[0.14, 0.25, 0.14, 0.14, 0.1, 0.115, 0.115],
        items.iter().map(|a| {
            vec![
                cell(&a.fecha),
                cell(&a.asunto),
                cell(&a.responsable),
                cell(&a.etapa),
                cell(&a.facturable),
                cell(&a.importe),
                cell(&a.duracion),
            ]
        }),
        styles,
    );
    let mut blocks = heading("Actuaciones", styles);
    blocks.push(LayoutBlock::Table(table));
    Some(RenderedSection::new(SectionKind::Actions, blocks))
}

/// Label over value, as shown in the balance strip.
fn figure(label: &str, value: &str, styles: &StyleSheet) -> Paragraph {
    Paragraph::new(
        vec![
            TextRun::bold(label).size(8.0).color(HEADING_GRAY),
            TextRun::bold(format!("\n{value}")).size(10.0).color(NAVY),
        ],
        &styles.normal_centered,
    )
}

/// Summary figures strip followed by the recovery ledger.
///
/// The strip always shows the record's own `cuantia`/`intereses`/`saldo`
/// fields; ledger rows never feed into it.
pub fn balance(record: &ExpedienteRecord, styles: &StyleSheet) -> Option<RenderedSection> {
    let items = record.recobros();
    if items.is_empty() {
        return None;
    }

    let grid = RuleStyle::new(0.5, GRID_GRAY);
    let strip = Table::new(
        columns(&[0.3333, 0.3333, 0.3333]),
        vec![vec![
            figure("Cuantía", record.cuantia(), styles),
            figure("Intereses", record.intereses(), styles),
            figure("Saldo", record.saldo(), styles),
        ]],
        TableStyle {
            padding: Padding::symmetric(2.0, 10.0),
            column_align: vec![TextAlign::Center; 3],
            outline: Some(grid),
            inner_grid: Some(grid),
            align: TableAlign::Left,
            ..TableStyle::default()
        },
    );

    let ledger = data_table(
        &["Tipo", "Fecha", "Descripción", "Haber", "Saldo"],
        &[0.15, 0.15, 0.4, 0.15, 0.15],
        items.iter().map(|r| {
            vec![
                cell(&r.tipo),
                cell(&r.fecha),
                cell(&r.descripcion),
                cell(&r.haber),
                cell(&r.saldo),
            ]
        }),
        styles,
    );

    let mut blocks = heading("Saldo", styles);
    blocks.push(LayoutBlock::Table(strip));
    blocks.push(LayoutBlock::spacer(SMALL_GAP));
    blocks.push(LayoutBlock::Table(ledger));
    Some(RenderedSection::new(SectionKind::Balance, blocks))
}

pub fn page_break() -> RenderedSection {
    RenderedSection::new(SectionKind::PageBreak, vec![LayoutBlock::PageBreak])
}
