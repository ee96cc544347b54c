//! Export the allocation to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::PeriodKind;
use crate::error::AppError;
use crate::optimise::AllocationResult;

/// Write one row per funded curve, in allocation order.
pub fn write_allocation_csv(
    path: &Path,
    allocation: &AllocationResult,
    period_kind: PeriodKind,
) -> Result<(), AppError> {
    let mut file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    write_allocation_rows(&mut file, allocation, period_kind)
}

fn write_allocation_rows<W: Write>(
    out: &mut W,
    allocation: &AllocationResult,
    period_kind: PeriodKind,
) -> Result<(), AppError> {
    writeln!(out, "key,period,period_label,tier,channel,step_index,spend,uplift")
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV header: {e}")))?;

    for e in &allocation.entries {
        writeln!(
            out,
            "{},{},{},{},{},{},{:.2},{:.6}",
            e.key,
            e.key.period,
            period_kind.label(e.key.period),
            e.key.tier,
            e.key.channel,
            e.step_index,
            e.spend,
            e.uplift,
        )
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Channel, CurveKey, Tier};
    use crate::optimise::AllocationEntry;

    #[test]
    fn rows_follow_allocation_order() {
        let allocation = AllocationResult {
            entries: vec![
                AllocationEntry {
                    key: CurveKey::new(10, Tier::Xxl, Channel::Crm),
                    step_index: 2,
                    spend: 20_000.0,
                    uplift: 12.5,
                },
                AllocationEntry {
                    key: CurveKey::new(11, Tier::Xxl, Channel::GoogleSearch),
                    step_index: 1,
                    spend: 10_000.0,
                    uplift: 8.0,
                },
            ],
            total_spend: 30_000.0,
            total_uplift: 20.5,
            eligible_curves: 4,
            steps_requested: 3,
            steps_used: 3,
            step: 10_000.0,
            trace: Vec::new(),
        };

        let mut buf = Vec::new();
        write_allocation_rows(&mut buf, &allocation, PeriodKind::Month).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "10__XXL__crm,10,Nov,XXL,crm,2,20000.00,12.500000");
        assert_eq!(lines[2], "11__XXL__google_search,11,Dec,XXL,google_search,1,10000.00,8.000000");
    }
}
