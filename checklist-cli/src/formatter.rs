use anyhow::Result;
use checklist_core::CheckReport;

/// Format a report as its plain text block, optionally preceded by metadata
pub fn format_text(report: &CheckReport, header: bool) -> String {
    let mut output = String::new();

    if header {
        output.push_str(&format!("Check: {} ({})\n", report.check, report.id));
        output.push_str(&format!("Platform: {}\n", report.platform));
        output.push_str(&format!("Hostname: {}\n", report.hostname));
        output.push_str(&format!(
            "Timestamp: {}\n",
            report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        output.push_str(&format!(
            "Run as root: {}\n",
            if report.run_as_root { "Yes" } else { "No" }
        ));
        output.push_str("─────────────────────────────────────────────────────────────\n");
    }

    output.push_str(&report.body);
    output.push('\n');
    output
}

/// Format a report as JSON
pub fn format_json(report: &CheckReport, pretty: bool) -> Result<String> {
    let mut output = if pretty {
        serde_json::to_string_pretty(report)?
    } else {
        serde_json::to_string(report)?
    };
    output.push('\n');
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use checklist_core::{Check, Platform};

    fn report() -> CheckReport {
        CheckReport::new(Check::Accounts, "2", Platform::Linux, "alice, root".to_string())
    }

    #[test]
    fn test_format_text_is_body() {
        assert_eq!(format_text(&report(), false), "alice, root\n");
    }

    #[test]
    fn test_format_text_header() {
        let output = format_text(&report(), true);
        assert!(output.starts_with("Check: accounts (2)\nPlatform: linux\n"));
        assert!(output.ends_with("─\nalice, root\n"));
    }

    #[test]
    fn test_format_json() {
        let compact = format_json(&report(), false).unwrap();
        assert_eq!(compact.lines().count(), 1);

        let value: serde_json::Value = serde_json::from_str(&format_json(&report(), true).unwrap()).unwrap();
        assert_eq!(value["check"], "accounts");
        assert_eq!(value["id"], "2");
        assert_eq!(value["body"], "alice, root");
    }
}
