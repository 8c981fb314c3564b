//! The persisted recommendation ledger and financial summaries.
//!
//! The ledger is a small CSV under the output directory with the fixed
//! header `vm_id,current_size,current_cost,recommended_size,new_cost,
//! monthly_savings`. A batch run replaces it wholesale; manual entries
//! append. Reading tolerates an absent or empty file by returning no
//! records, so every summary path works before the first batch run.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use leasewise_types::{LeasewiseError, RecommendationRecord, Result};

use crate::report::{count, pct, usd};

/// The ledger header row, written verbatim.
pub const LEDGER_HEADER: &str =
    "vm_id,current_size,current_cost,recommended_size,new_cost,monthly_savings";

/// Handle to the on-disk recommendation ledger.
#[derive(Debug, Clone)]
pub struct SavingsLedger {
    path: PathBuf,
}

impl SavingsLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read all records. An absent or empty file yields an empty list;
    /// a malformed row is an error naming the row.
    pub fn read(&self) -> Result<Vec<RecommendationRecord>> {
        if !self.path.is_file() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        let mut records = Vec::new();
        for (line_no, line) in content.lines().enumerate() {
            if line_no == 0 || line.trim().is_empty() {
                continue;
            }
            records.push(parse_row(line, line_no + 1)?);
        }
        Ok(records)
    }

    /// Replace the ledger with the given records.
    ///
    /// The previous file is removed first so a failed write never
    /// leaves stale rows behind.
    pub fn replace(&self, records: &[RecommendationRecord]) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        let mut out = String::from(LEDGER_HEADER);
        out.push('\n');
        for record in records {
            out.push_str(&format_row(record));
            out.push('\n');
        }
        std::fs::write(&self.path, out)?;
        debug!(path = %self.path.display(), rows = records.len(), "ledger replaced");
        Ok(())
    }

    /// Append one record, creating the file with a header if needed.
    pub fn append(&self, record: &RecommendationRecord) -> Result<()> {
        let mut records = self.read()?;
        records.push(record.clone());
        self.replace(&records)
    }

    /// Remove the ledger file. Returns whether a file existed.
    pub fn clear(&self) -> Result<bool> {
        if self.path.is_file() {
            std::fs::remove_file(&self.path)?;
            debug!(path = %self.path.display(), "ledger cleared");
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

fn format_row(record: &RecommendationRecord) -> String {
    format!(
        "{},{},{},{},{},{}",
        record.vm_id,
        record.current_size,
        record.current_cost,
        record.recommended_size,
        record.new_cost,
        record.monthly_savings,
    )
}

fn parse_row(line: &str, row: usize) -> Result<RecommendationRecord> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() != 6 {
        return Err(LeasewiseError::DatasetInvalid {
            reason: format!("ledger row {row}: expected 6 fields, found {}", fields.len()),
        });
    }
    let number = |idx: usize, name: &str| -> Result<f64> {
        fields[idx]
            .parse::<f64>()
            .map_err(|_| LeasewiseError::DatasetInvalid {
                reason: format!(
                    "ledger row {row}: column '{name}' is not a number: '{}'",
                    fields[idx]
                ),
            })
    };
    Ok(RecommendationRecord {
        vm_id: fields[0].to_string(),
        current_size: fields[1].to_string(),
        current_cost: number(2, "current_cost")?,
        recommended_size: fields[3].to_string(),
        new_cost: number(4, "new_cost")?,
        monthly_savings: number(5, "monthly_savings")?,
    })
}

/// Validate manual-entry fields into a record without touching disk.
///
/// The savings figure is derived, not taken from the caller, so the
/// ledger stays internally consistent.
pub fn manual_entry(
    vm_id: &str,
    current_size: &str,
    current_cost: &str,
    recommended_size: &str,
    new_cost: &str,
) -> Result<RecommendationRecord> {
    let parse = |value: &str, name: &str| -> Result<f64> {
        value.trim().parse::<f64>().map_err(|_| {
            LeasewiseError::Validation(format!("'{name}' must be a number, got '{value}'"))
        })
    };
    let vm_id = vm_id.trim();
    if vm_id.is_empty() {
        return Err(LeasewiseError::Validation("'vm_id' must not be empty".into()));
    }
    let current_cost = parse(current_cost, "current_cost")?;
    let new_cost = parse(new_cost, "new_cost")?;
    Ok(RecommendationRecord {
        vm_id: vm_id.to_string(),
        current_size: current_size.trim().to_string(),
        current_cost,
        recommended_size: recommended_size.trim().to_string(),
        new_cost,
        monthly_savings: current_cost - new_cost,
    })
}

// ── Summaries ────────────────────────────────────────────────────────────

/// Aggregate financial view over the ledger.
#[derive(Debug, Clone)]
pub struct SavingsSummary {
    pub record_count: usize,
    /// Sum of `current_cost` across the ledger.
    pub total_current: f64,
    /// Sum of `new_cost` across the ledger.
    pub total_new: f64,
    pub total_monthly: f64,
    pub total_annual: f64,
    pub average_per_vm: f64,
    /// Savings as a share of the recommended VMs' current spend; zero
    /// when the ledger is empty.
    pub reduction_pct: f64,
}

/// Summarize ledger records. All totals come from the ledger itself,
/// so the reduction percentage is savings over the current cost of the
/// VMs that actually have recommendations.
pub fn summarize(records: &[RecommendationRecord]) -> SavingsSummary {
    let total_current: f64 = records.iter().map(|r| r.current_cost).sum();
    let total_new: f64 = records.iter().map(|r| r.new_cost).sum();
    let total_monthly: f64 = records.iter().map(|r| r.monthly_savings).sum();
    let average_per_vm = if records.is_empty() {
        0.0
    } else {
        total_monthly / records.len() as f64
    };
    let reduction_pct = if total_current > 0.0 {
        total_monthly / total_current * 100.0
    } else {
        if total_monthly > 0.0 {
            warn!("ledger has savings but zero current cost; reporting 0% reduction");
        }
        0.0
    };
    SavingsSummary {
        record_count: records.len(),
        total_current,
        total_new,
        total_monthly,
        total_annual: total_monthly * 12.0,
        average_per_vm,
        reduction_pct,
    }
}

/// Top `n` records by monthly savings descending. Ties keep ledger order.
pub fn top(records: &[RecommendationRecord], n: usize) -> Vec<&RecommendationRecord> {
    let mut sorted: Vec<&RecommendationRecord> = records.iter().collect();
    sorted.sort_by(|a, b| b.monthly_savings.total_cmp(&a.monthly_savings));
    sorted.truncate(n);
    sorted
}

/// Render the financial summary as markdown.
pub fn render_summary(summary: &SavingsSummary) -> String {
    let mut out = String::from("\n## TOTAL SAVINGS SUMMARY\n\n");
    out.push_str("| Metric | Value |\n|--------|-------|\n");
    out.push_str(&format!("| VMs with Recommendations | {} |\n", count(summary.record_count)));
    out.push_str(&format!("| Current Monthly Cost | {} |\n", usd(summary.total_current)));
    out.push_str(&format!("| Projected Monthly Cost | {} |\n", usd(summary.total_new)));
    out.push_str(&format!("| Total Monthly Savings | {} |\n", usd(summary.total_monthly)));
    out.push_str(&format!("| Projected Annual Savings | {} |\n", usd(summary.total_annual)));
    out.push_str(&format!("| Average Savings per VM | {} |\n", usd(summary.average_per_vm)));
    out.push_str(&format!("| Cost Reduction | {} |\n", pct(summary.reduction_pct)));
    out
}

/// Render the top savings opportunities as markdown.
pub fn render_top(records: &[&RecommendationRecord]) -> String {
    let mut out = format!("\n## TOP {} SAVINGS OPPORTUNITIES\n\n", records.len());
    if records.is_empty() {
        out.push_str("The ledger is empty; run a batch analysis first.\n");
        return out;
    }
    out.push_str("| Rank | VM ID | Current Size | Recommended | Monthly Savings |\n");
    out.push_str("|------|-------|--------------|-------------|------------------|\n");
    for (i, record) in records.iter().enumerate() {
        out.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            i + 1,
            record.vm_id,
            record.current_size,
            record.recommended_size,
            usd(record.monthly_savings),
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(id: &str, current: f64, new: f64) -> RecommendationRecord {
        RecommendationRecord {
            vm_id: id.into(),
            current_size: "Standard_D4s_v3".into(),
            current_cost: current,
            recommended_size: "Standard_B2s".into(),
            new_cost: new,
            monthly_savings: current - new,
        }
    }

    fn ledger_in(dir: &tempfile::TempDir) -> SavingsLedger {
        SavingsLedger::new(dir.path().join("output").join("savings_report.csv"))
    }

    #[test]
    fn absent_ledger_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ledger_in(&dir);
        assert!(ledger.read().unwrap().is_empty());
    }

    #[test]
    fn replace_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ledger_in(&dir);
        let records = vec![rec("vm-1", 280.32, 30.37), rec("vm-2", 140.16, 60.74)];
        ledger.replace(&records).unwrap();

        let content = std::fs::read_to_string(ledger.path()).unwrap();
        assert!(content.starts_with(LEDGER_HEADER));

        let read = ledger.read().unwrap();
        assert_eq!(read.len(), 2);
        assert_eq!(read[0].vm_id, "vm-1");
        assert_eq!(read[0].monthly_savings, 280.32 - 30.37);
    }

    #[test]
    fn replace_discards_previous_rows() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ledger_in(&dir);
        ledger.replace(&[rec("vm-old", 100.0, 50.0)]).unwrap();
        ledger.replace(&[rec("vm-new", 200.0, 75.0)]).unwrap();
        let read = ledger.read().unwrap();
        assert_eq!(read.len(), 1);
        assert_eq!(read[0].vm_id, "vm-new");
    }

    #[test]
    fn append_creates_and_extends() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ledger_in(&dir);
        ledger.append(&rec("vm-1", 100.0, 40.0)).unwrap();
        ledger.append(&rec("vm-2", 90.0, 30.0)).unwrap();
        assert_eq!(ledger.read().unwrap().len(), 2);
    }

    #[test]
    fn clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ledger_in(&dir);
        assert!(!ledger.clear().unwrap());
        ledger.replace(&[rec("vm-1", 100.0, 40.0)]).unwrap();
        assert!(ledger.clear().unwrap());
        assert!(!ledger.clear().unwrap());
        assert!(ledger.read().unwrap().is_empty());
    }

    #[test]
    fn malformed_row_names_position() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("savings_report.csv");
        std::fs::write(
            &path,
            format!("{LEDGER_HEADER}\nvm-1,Standard_D4s_v3,abc,Standard_B2s,30.37,10.0\n"),
        )
        .unwrap();
        let err = SavingsLedger::new(&path).read().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("row 2"));
        assert!(msg.contains("current_cost"));
    }

    #[test]
    fn manual_entry_derives_savings() {
        let record =
            manual_entry("vm-7", "Standard_E4s_v3", "183.96", "Standard_B4ms", "60.74").unwrap();
        assert!((record.monthly_savings - (183.96 - 60.74)).abs() < 1e-9);
    }

    #[test]
    fn manual_entry_rejects_bad_input() {
        assert!(manual_entry("", "a", "1", "b", "2").is_err());
        let err = manual_entry("vm-1", "a", "cheap", "b", "2").unwrap_err();
        assert!(err.to_string().contains("current_cost"));
    }

    #[test]
    fn summary_math() {
        let records = vec![rec("vm-1", 280.32, 30.37), rec("vm-2", 140.16, 60.74)];
        let summary = summarize(&records);
        let expected_current = 280.32 + 140.16;
        let expected_new = 30.37 + 60.74;
        let expected_monthly = expected_current - expected_new;
        assert!((summary.total_current - expected_current).abs() < 1e-9);
        assert!((summary.total_new - expected_new).abs() < 1e-9);
        assert!((summary.total_monthly - expected_monthly).abs() < 1e-9);
        assert!((summary.total_annual - expected_monthly * 12.0).abs() < 1e-9);
        assert!((summary.average_per_vm - expected_monthly / 2.0).abs() < 1e-9);
        assert!(
            (summary.reduction_pct - expected_monthly / expected_current * 100.0).abs() < 1e-9
        );
    }

    #[test]
    fn reduction_is_relative_to_ledger_current_cost() {
        // One VM going from 100 to 40 is a 60% reduction, whatever the
        // rest of the fleet costs.
        let summary = summarize(&[rec("vm-1", 100.0, 40.0)]);
        assert!((summary.reduction_pct - 60.0).abs() < 1e-9);
    }

    #[test]
    fn summary_guards_zero_denominators() {
        let summary = summarize(&[]);
        assert_eq!(summary.record_count, 0);
        assert_eq!(summary.total_current, 0.0);
        assert_eq!(summary.average_per_vm, 0.0);
        assert_eq!(summary.reduction_pct, 0.0);
    }

    #[test]
    fn top_orders_by_savings_and_keeps_ties_stable() {
        let records = vec![
            rec("vm-a", 100.0, 50.0),
            rec("vm-b", 300.0, 50.0),
            rec("vm-c", 100.0, 50.0),
        ];
        let best = top(&records, 2);
        assert_eq!(best[0].vm_id, "vm-b");
        assert_eq!(best[1].vm_id, "vm-a");
    }

    #[test]
    fn render_summary_formats_currency() {
        let summary = summarize(&[rec("vm-1", 1280.32, 30.37)]);
        let text = render_summary(&summary);
        assert!(text.contains("| Current Monthly Cost | $1,280.32 |"));
        assert!(text.contains("| Projected Monthly Cost | $30.37 |"));
        assert!(text.contains("$1,249.95"));
        assert!(text.contains("$14,999.40"));
    }
}
