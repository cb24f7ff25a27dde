//! HTML parser for the film listing page
//!
//! This module handles parsing HTML content to extract:
//! - Year selector anchors (`a.year-link`, id = year)
//! - Rendered film rows (`tbody#table-body tr.film`)

use crate::record::{RawField, RawRecord};
use scraper::{ElementRef, Html, Selector};

/// A year selector anchor found on the page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearLink {
    /// The year this anchor loads
    pub year: i32,

    /// Whether the page marks this anchor as the preselected one
    pub active: bool,
}

/// Extracts all year selector anchors in document order
///
/// # Extraction Rules
///
/// **Include:**
/// - `<a class="year-link" id="2015">` anchors whose id parses as an integer
///
/// **Exclude:**
/// - Anchors without an id, or with a non-numeric id
///
/// # Example
///
/// ```
/// use oscar_crawl::crawler::parse_year_links;
///
/// let html = r##"<a href="#" class="year-link active" id="2015">2015</a>"##;
/// let links = parse_year_links(html);
/// assert_eq!(links[0].year, 2015);
/// assert!(links[0].active);
/// ```
pub fn parse_year_links(html: &str) -> Vec<YearLink> {
    let document = Html::parse_document(html);
    let mut links = Vec::new();

    if let Ok(selector) = Selector::parse("a.year-link") {
        for element in document.select(&selector) {
            let Some(year) = element
                .value()
                .attr("id")
                .and_then(|id| id.trim().parse::<i32>().ok())
            else {
                continue;
            };

            let active = element.value().classes().any(|class| class == "active");
            links.push(YearLink { year, active });
        }
    }

    links
}

/// Extracts the rendered film rows of the results table
///
/// Cell text is passed through untouched; [`crate::record::normalize`] is
/// responsible for trimming and type checks. A row missing a cell yields a
/// raw record with that field absent so the failure surfaces during
/// normalization rather than being dropped here.
///
/// # Arguments
///
/// * `html` - The rendered page content
/// * `year` - The year currently loaded into the table
///
/// # Returns
///
/// The rows in document order; empty when the table has not been populated.
pub fn parse_film_rows(html: &str, year: i32) -> Vec<RawRecord> {
    let document = Html::parse_document(html);
    let mut rows = Vec::new();

    let (Ok(row_selector), Ok(title), Ok(nominations), Ok(awards), Ok(flag)) = (
        Selector::parse("tbody#table-body tr.film"),
        Selector::parse("td.film-title"),
        Selector::parse("td.film-nominations"),
        Selector::parse("td.film-awards"),
        Selector::parse("td.film-best-picture i.glyphicon-flag"),
    ) else {
        return rows;
    };

    for row in document.select(&row_selector) {
        rows.push(RawRecord {
            title: cell_text(&row, &title),
            year: Some(RawField::Int(year.into())),
            nominations: cell_text(&row, &nominations),
            awards: cell_text(&row, &awards),
            best_picture: Some(RawField::Bool(row.select(&flag).next().is_some())),
        });
    }

    rows
}

fn cell_text(row: &ElementRef<'_>, selector: &Selector) -> Option<RawField> {
    row.select(selector)
        .next()
        .map(|cell| RawField::Text(cell.text().collect::<String>()))
}
