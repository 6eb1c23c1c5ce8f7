use crate::domain::fare::FareOffer;
use crate::error::CheckerError;
use crate::report::group::MonthGroup;
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Placeholder the generated fare listing replaces in the template.
pub const CONTENT_PLACEHOLDER: &str = "{{FLIGHT_CONTENT}}";

#[derive(Debug, Clone)]
pub struct Renderer {
    template: String,
    cheap_threshold: Decimal,
}

impl Renderer {
    pub fn load(path: &Path, cheap_threshold: Decimal) -> Result<Self, CheckerError> {
        let template =
            std::fs::read_to_string(path).map_err(|e| CheckerError::TemplateMissing {
                path: PathBuf::from(path),
                detail: e.to_string(),
            })?;

        if !template.contains(CONTENT_PLACEHOLDER) {
            tracing::warn!(
                path = %path.display(),
                placeholder = CONTENT_PLACEHOLDER,
                "template has no placeholder; fare listing will be dropped"
            );
        }

        Ok(Self::from_template(template, cheap_threshold))
    }

    pub fn from_template(template: impl Into<String>, cheap_threshold: Decimal) -> Self {
        Self {
            template: template.into(),
            cheap_threshold,
        }
    }

    /// Fills the template placeholder with the listing for `groups`.
    pub fn render_document(&self, groups: &[MonthGroup]) -> String {
        self.template
            .replacen(CONTENT_PLACEHOLDER, &self.render_fragment(groups), 1)
    }

    /// HTML listing with one section per month.
    pub fn render_fragment(&self, groups: &[MonthGroup]) -> String {
        if groups.is_empty() {
            return "<p>No qualifying fares found.</p>".to_string();
        }

        let with_year = spans_several_years(groups);
        let mut html = String::new();
        for group in groups {
            let _ = write!(html, "<h2>📅 {}</h2><ul>", heading(group, with_year));
            for offer in &group.offers {
                let class = if offer.is_cheaper_than(self.cheap_threshold) {
                    " class=\"cheapest\""
                } else {
                    ""
                };
                let _ = write!(
                    html,
                    "<li{class}>{} → {:.2} {}{} ({} → {})</li>",
                    offer.date,
                    offer.price_source,
                    escape(&offer.source_currency),
                    converted_suffix(offer, escape),
                    escape(&offer.origin),
                    escape(&offer.destination),
                );
            }
            html.push_str("</ul>");
        }
        html
    }
}

/// Plain-text listing used for logs and dry runs.
pub fn render_summary(groups: &[MonthGroup]) -> String {
    if groups.is_empty() {
        return "no qualifying fares".to_string();
    }

    let with_year = spans_several_years(groups);
    let mut out = String::new();
    for group in groups {
        let _ = writeln!(out, "{}:", heading(group, with_year));
        for offer in &group.offers {
            let _ = writeln!(
                out,
                "  {} {:.2} {}{} ({} -> {})",
                offer.date,
                offer.price_source,
                offer.source_currency,
                converted_suffix(offer, |s| s.to_string()),
                offer.origin,
                offer.destination,
            );
        }
    }
    out.trim_end().to_string()
}

fn converted_suffix(offer: &FareOffer, esc: impl Fn(&str) -> String) -> String {
    match offer.price_converted {
        Some(converted) => format!(" ({converted:.2} {})", esc(&offer.target_currency)),
        None => String::new(),
    }
}

fn heading(group: &MonthGroup, with_year: bool) -> String {
    if with_year {
        format!("{} {}", group.name(), group.year)
    } else {
        group.name().to_string()
    }
}

fn spans_several_years(groups: &[MonthGroup]) -> bool {
    groups.iter().map(|g| g.year).collect::<BTreeSet<_>>().len() > 1
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
