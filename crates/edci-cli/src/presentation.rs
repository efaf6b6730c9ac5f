//! Terminal rendering of cycle reports.
//!
//! The only place a [`Status`] is turned into a label or a colour. Numbers are rounded here and
//! nowhere else; the engine always hands over full precision.

use colored::{Color, ColoredString, Colorize};
use edci_core::{CycleReport, DataIntegrityError, FacilityAssessment, FleetSummary, Status};
use tabled::{settings::Style, Table, Tabled};

/// How a status is shown on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusStyle {
    pub label: &'static str,
    pub colour: Color,
    /// Emergency rows are highlighted beyond their colour.
    pub emphasis: bool,
}

pub fn status_style(status: Status) -> StatusStyle {
    match status {
        Status::Emergency => StatusStyle {
            label: "EMERGENCY",
            colour: Color::Red,
            emphasis: true,
        },
        Status::Warning => StatusStyle {
            label: "WARNING",
            colour: Color::Yellow,
            emphasis: false,
        },
        Status::Normal => StatusStyle {
            label: "NORMAL",
            colour: Color::Green,
            emphasis: false,
        },
    }
}

pub fn status_label(status: Status) -> ColoredString {
    let style = status_style(status);
    let label = style.label.color(style.colour);
    if style.emphasis {
        label.bold()
    } else {
        label
    }
}

fn one_decimal(value: f64) -> String {
    format!("{value:.1}")
}

#[derive(Tabled)]
struct FacilityRow {
    #[tabled(rename = "#")]
    rank: usize,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "EDCI")]
    edci: String,
    #[tabled(rename = "PBR")]
    pbr: String,
    #[tabled(rename = "NBR")]
    nbr: String,
    #[tabled(rename = "Patients")]
    patients: u64,
    #[tabled(rename = "Waiting")]
    waiting: u32,
    #[tabled(rename = "Alerts")]
    alerts: usize,
}

impl FacilityRow {
    fn new(rank: usize, a: &FacilityAssessment) -> Self {
        Self {
            rank,
            id: a.id().to_string(),
            name: a.reading.name.to_string(),
            status: status_label(a.status).to_string(),
            edci: one_decimal(a.metrics.edci),
            pbr: one_decimal(a.metrics.adjusted_pbr),
            nbr: one_decimal(a.metrics.nbr),
            patients: a.reading.total_patients(),
            waiting: a.reading.flow.waiting_for_admission,
            alerts: a.alert_reasons.len(),
        }
    }
}

/// Ranked facility table followed by the fleet summary and any rejected facilities.
pub fn render_cycle(report: &CycleReport, filter: Option<Status>) -> String {
    let mut out = String::new();

    if report.is_empty_batch() {
        out.push_str("No facilities reported this cycle.\n");
        return out;
    }

    let rows: Vec<FacilityRow> = report
        .ranked_by_congestion()
        .into_iter()
        .enumerate()
        .filter(|(_, a)| filter.map_or(true, |s| a.status == s))
        .map(|(i, a)| FacilityRow::new(i + 1, a))
        .collect();

    if rows.is_empty() {
        match filter {
            Some(status) => out.push_str(&format!("No facilities with status {status}.\n")),
            None => out.push_str("No facilities could be assessed this cycle.\n"),
        }
    } else {
        out.push_str(&Table::new(rows).with(Style::rounded()).to_string());
        out.push('\n');
    }

    out.push('\n');
    out.push_str(&render_summary(&report.summary));

    if !report.rejected.is_empty() {
        out.push('\n');
        out.push_str(&render_rejections(&report.rejected));
    }
    out
}

pub fn render_summary(summary: &FleetSummary) -> String {
    let mean = summary
        .mean_edci
        .map(one_decimal)
        .unwrap_or_else(|| "n/a".to_string());
    let counts = &summary.status_counts;
    format!(
        "Facilities: {}  Patients: {}  Waiting for admission: {}  Mean EDCI: {}\n{} {}  {} {}  {} {}\n",
        summary.facility_count,
        summary.total_patients,
        summary.total_waiting,
        mean,
        status_label(Status::Emergency),
        counts.emergency,
        status_label(Status::Warning),
        counts.warning,
        status_label(Status::Normal),
        counts.normal,
    )
}

/// JSON form of a cycle for `--json`.
///
/// With a status filter, `facilities` keeps only matching facilities and `status_filter` names
/// the filter. `summary` and `rejected` still cover the whole cycle.
pub fn cycle_json(
    report: &CycleReport,
    status: Option<Status>,
) -> serde_json::Result<serde_json::Value> {
    let mut value = serde_json::to_value(report)?;
    if let Some(status) = status {
        value["facilities"] = serde_json::to_value(report.facilities_with_status(status))?;
        value["status_filter"] = serde_json::to_value(status)?;
    }
    Ok(value)
}

pub fn render_rejections(rejected: &[DataIntegrityError]) -> String {
    let noun = if rejected.len() == 1 {
        "facility"
    } else {
        "facilities"
    };
    let mut out = format!(
        "{} {} {} excluded:\n",
        "[WARN]".yellow().bold(),
        rejected.len(),
        noun
    );
    for err in rejected {
        out.push_str(&format!("  - {err}\n"));
    }
    out
}

/// Detail view of one facility, alert reasons included.
pub fn render_facility(a: &FacilityAssessment) -> String {
    let r = &a.reading;
    let mut out = format!(
        "{} ({})  {}\n",
        r.name,
        a.id(),
        status_label(a.status)
    );
    out.push_str(&format!(
        "  EDCI {} ({})\n",
        one_decimal(a.metrics.edci),
        match a.metrics.edci_source {
            edci_core::EdciSource::Reported => "reported",
            edci_core::EdciSource::Derived => "derived",
        }
    ));
    out.push_str(&format!(
        "  Triage L1-L5: {} / {} / {} / {} / {}  (total {})\n",
        r.triage.l1,
        r.triage.l2,
        r.triage.l3,
        r.triage.l4,
        r.triage.l5,
        r.total_patients()
    ));
    out.push_str(&format!(
        "  Staff: {} attending, {} residents, {} nurses\n",
        r.staffing.attending_physicians, r.staffing.residents, r.staffing.nurses
    ));
    out.push_str(&format!(
        "  PBR {}  NBR {}\n",
        one_decimal(a.metrics.adjusted_pbr),
        one_decimal(a.metrics.nbr)
    ));
    out.push_str(&format!(
        "  Waiting {}  Over 24h {}  Avg transfer {} h\n",
        r.flow.waiting_for_admission,
        r.flow.over_24_hours,
        one_decimal(r.flow.avg_transfer_time)
    ));

    if a.alert_reasons.is_empty() {
        out.push_str("  No alert reasons.\n");
    } else {
        out.push_str("  Alert reasons:\n");
        for reason in &a.alert_reasons {
            out.push_str(&format!("    - {}\n", reason.message));
        }
    }
    out
}
