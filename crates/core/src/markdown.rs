//! Markdown rendering for dose alert cards.
//!
//! Builds the card detail that explains a high-dosage alert: the substance, the medications
//! contributing to it, one section per route of administration and a closing conclusion.
//! Number formatting helpers used by card summaries live here too.

use crate::dose::aggregation::{AggregatedMedicationsBySubstance, DosageComparisonByRoute};

const NEW_LINE: &str = "\n";

/// Service for rendering dose alert details as markdown.
#[derive(Debug, Clone, Default)]
pub struct MarkdownService;

impl MarkdownService {
    /// Creates a new `MarkdownService` instance.
    pub fn new() -> Self {
        Self
    }

    /// Renders the detail of a dose alert card.
    ///
    /// Format produced:
    /// ```markdown
    /// Substance : <substance>
    ///
    /// Present in this patient’s medication :
    /// - <medication>
    ///
    /// Route of administration :
    /// - <route>
    ///   - Prescribed daily dose : <total><unit>
    ///   - Recommended average daily dose : <ddd><unit>
    ///   - Prescribed amount is <factor> times over the average daily dose
    ///
    /// Conclusion : Combined prescribed amount is <factor> times the average daily dose.
    /// ```
    ///
    /// # Arguments
    ///
    /// * `substance` - Aggregated doses of one substance
    /// * `factor` - Combined factor over all routes
    ///
    /// # Returns
    ///
    /// Markdown text for the card `detail` field.
    pub fn dose_alert_detail(
        &self,
        substance: &AggregatedMedicationsBySubstance,
        factor: f64,
    ) -> String {
        let mut out = String::new();
        out.push_str(&format!("Substance : {}", substance.substance_display));
        out.push_str(NEW_LINE);
        out.push_str(NEW_LINE);
        out.push_str("Present in this patient’s medication :");
        out.push_str(NEW_LINE);
        out.push_str(&self.unordered_list(&substance.medications, 0));
        out.push_str(NEW_LINE);
        out.push_str(NEW_LINE);
        out.push_str("Route of administration :");
        out.push_str(NEW_LINE);
        for route in &substance.routes {
            out.push_str(&self.route_section(route));
            out.push_str(NEW_LINE);
            out.push_str(NEW_LINE);
        }
        out.push_str(&format!(
            "Conclusion : Combined prescribed amount is {} times the average daily dose.",
            two_decimals(factor)
        ));
        out
    }

    fn route_section(&self, route: &DosageComparisonByRoute) -> String {
        let details = [
            format!(
                "Prescribed daily dose : {}{}",
                two_decimals(route.total.quantity),
                route.total.unit
            ),
            format!(
                "Recommended average daily dose : {}{}",
                with_fraction(route.reference.dose),
                route.reference.unit
            ),
            format!(
                "Prescribed amount is {} times over the average daily dose",
                two_decimals(route.factor())
            ),
        ];
        let mut section = self.unordered_list(std::slice::from_ref(&route.route_label), 0);
        section.push_str(NEW_LINE);
        section.push_str(&self.unordered_list(&details, 1));
        section
    }

    /// Renders `items` as a bulleted list, two spaces of indent per `level`.
    fn unordered_list(&self, items: &[String], level: usize) -> String {
        let indent = "  ".repeat(level);
        items
            .iter()
            .map(|item| format!("{indent}- {}", escape_item(item)))
            .collect::<Vec<_>>()
            .join(NEW_LINE)
    }
}

/// Fixed two decimal places, e.g. `3.00`.
pub fn two_decimals(value: f64) -> String {
    format!("{value:.2}")
}

/// At most two decimal places with trailing zeros removed, e.g. `6`, `2.5`, `3.33`.
pub fn trimmed_decimals(value: f64) -> String {
    let fixed = two_decimals(value);
    if fixed.contains('.') {
        fixed.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        fixed
    }
}

/// Shortest decimal form that always keeps a fractional part, e.g. `3.0`, `0.15`.
pub fn with_fraction(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

/// List items are single lines.
fn escape_item(item: &str) -> String {
    item.replace(['\r', '\n'], " ")
}
