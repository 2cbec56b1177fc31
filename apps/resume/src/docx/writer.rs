use std::io::Cursor;

use docx_rs::{
    AbstractNumbering, AlignmentType, BorderType, Docx, IndentLevel, Level, LevelJc, LevelText,
    NumberFormat, Numbering, NumberingId, PageMargin, Paragraph, ParagraphBorder,
    ParagraphBorderPosition, ParagraphBorders, Run, RunFonts, SpecialIndentType, Start, Style, StyleType, Table,
    TableCell, TableRow, WidthType,
};

use crate::docx::layout::{Block, DocStyle, Span, MARKER_COLOR};
use crate::docx::DocxError;

// Twentieths of a point: 1in = 1440.
const MARGIN_TOP_BOTTOM: i32 = 720;
const MARGIN_LEFT_RIGHT: i32 = 1080;
const INDENT: i32 = 360;
const CATEGORY_COLUMN: usize = 2160;
const SKILLS_COLUMN: usize = 7200;

const BODY_FONT: &str = "Calibri";
const BODY_SIZE_PT: u8 = 11;
const BULLET_NUMBERING: usize = 1;

/// Word sizes are half-points.
fn half_points(pt: u8) -> usize {
    usize::from(pt) * 2
}

fn run(span: &Span) -> Run {
    let mut run = Run::new().add_text(&span.text);
    if span.bold {
        run = run.bold();
    }
    if span.italic {
        run = run.italic();
    }
    if let Some(pt) = span.size_pt {
        run = run.size(half_points(pt));
    }
    if let Some(color) = span.color {
        run = run.color(color);
    }
    run
}

const HEADING_1: &str = "Heading1";
const HEADING_2: &str = "Heading2";

/// Section structure lives in real heading styles, which is what ATS
/// parsers look for.
fn heading_styles(style: DocStyle) -> [Style; 2] {
    let title_pt = match style {
        DocStyle::Formatted => 20,
        DocStyle::Ats => 16,
    };
    let fonts = || RunFonts::new().ascii(BODY_FONT).hi_ansi(BODY_FONT);
    [
        Style::new(HEADING_1, StyleType::Paragraph)
            .name("Heading 1")
            .fonts(fonts())
            .size(half_points(title_pt))
            .bold()
            .color("000000"),
        Style::new(HEADING_2, StyleType::Paragraph)
            .name("Heading 2")
            .fonts(fonts())
            .size(half_points(14))
            .bold()
            .color("000000"),
    ]
}

fn heading(level: u8, text: &str) -> Paragraph {
    let paragraph = Paragraph::new().add_run(Run::new().add_text(text));
    if level == 1 {
        paragraph.style(HEADING_1).align(AlignmentType::Center)
    } else {
        paragraph.style(HEADING_2)
    }
}

/// An empty paragraph with a thin bottom border in the accent color.
fn rule() -> Paragraph {
    Paragraph::new().set_borders(
        ParagraphBorders::with_empty().set(
            ParagraphBorder::new(ParagraphBorderPosition::Bottom)
                .val(BorderType::Single)
                .size(6)
                .color(MARKER_COLOR),
        ),
    )
}

fn skill_table(rows: &[(String, String)]) -> Table {
    let rows = rows
        .iter()
        .map(|(category, skills)| {
            TableRow::new(vec![
                TableCell::new()
                    .add_paragraph(Paragraph::new().add_run(Run::new().add_text(category).bold()))
                    .width(CATEGORY_COLUMN, WidthType::Dxa),
                TableCell::new()
                    .add_paragraph(Paragraph::new().add_run(Run::new().add_text(skills)))
                    .width(SKILLS_COLUMN, WidthType::Dxa),
            ])
        })
        .collect();
    Table::new(rows).set_grid(vec![CATEGORY_COLUMN, SKILLS_COLUMN])
}

fn bullet_numbering() -> AbstractNumbering {
    AbstractNumbering::new(BULLET_NUMBERING).add_level(
        Level::new(
            0,
            Start::new(1),
            NumberFormat::new("bullet"),
            LevelText::new("\u{2022}"),
            LevelJc::new("left"),
        )
        .indent(
            Some(INDENT * 2),
            Some(SpecialIndentType::Hanging(INDENT)),
            None,
            None,
        ),
    )
}

/// Renders document blocks to `.docx` bytes.
pub fn write_docx(blocks: &[Block], style: DocStyle) -> Result<Vec<u8>, DocxError> {
    let mut docx = Docx::new()
        .page_margin(
            PageMargin::new()
                .top(MARGIN_TOP_BOTTOM)
                .bottom(MARGIN_TOP_BOTTOM)
                .left(MARGIN_LEFT_RIGHT)
                .right(MARGIN_LEFT_RIGHT),
        )
        .default_fonts(RunFonts::new().ascii(BODY_FONT).hi_ansi(BODY_FONT))
        .default_size(half_points(BODY_SIZE_PT))
        .add_abstract_numbering(bullet_numbering())
        .add_numbering(Numbering::new(BULLET_NUMBERING, BULLET_NUMBERING));
    for heading_style in heading_styles(style) {
        docx = docx.add_style(heading_style);
    }

    for block in blocks {
        docx = match block {
            Block::Heading { level, text } => docx.add_paragraph(heading(*level, text)),
            Block::Paragraph {
                spans,
                centered,
                indented,
            } => {
                let mut paragraph = spans
                    .iter()
                    .fold(Paragraph::new(), |p, span| p.add_run(run(span)));
                if *centered {
                    paragraph = paragraph.align(AlignmentType::Center);
                }
                if *indented {
                    paragraph = paragraph.indent(Some(INDENT), None, None, None);
                }
                docx.add_paragraph(paragraph)
            }
            Block::Bullet(text) => docx.add_paragraph(
                Paragraph::new()
                    .add_run(Run::new().add_text(text))
                    .numbering(NumberingId::new(BULLET_NUMBERING), IndentLevel::new(0)),
            ),
            Block::Rule => docx.add_paragraph(rule()),
            Block::Spacer => docx.add_paragraph(Paragraph::new()),
            Block::SkillTable(rows) => docx.add_table(skill_table(rows)),
        };
    }

    let mut buffer = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut buffer)
        .map_err(|e| DocxError::Pack(e.to_string()))?;
    Ok(buffer.into_inner())
}
