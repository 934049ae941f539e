use super::{Collector, Host};
use crate::error::Result;
use crate::platform::Platform;
use crate::source::SourceRef;

/// Latest installed hotfix, by numeric KB id
const HOTFIX_SCRIPT: &str = r#"
$latestHotfix = Get-HotFix | Sort-Object {
    [int]($_.HotFixID -replace 'KB', '')
} -Descending | Select-Object -First 1

Write-Output "Source: $($latestHotfix.PsComputerName)"
Write-Output "HotFixID: $($latestHotfix.HotFixID)"
Write-Output "InstalledOn: $($latestHotfix.InstalledOn)"
"#;

/// Kernel / patch level
pub struct PatchingCollector;

impl PatchingCollector {
    pub fn new() -> Self {
        Self
    }

    fn source_for(platform: Platform) -> SourceRef {
        match platform {
            Platform::Windows => SourceRef::command("powershell", ["-Command", HOTFIX_SCRIPT]),
            Platform::Linux | Platform::MacOs => SourceRef::command("uname", ["-a"]),
        }
    }

    pub fn collect(&self, host: &Host<'_>) -> Result<String> {
        let lines = host.required(&Self::source_for(host.platform))?;
        Ok(lines.join("\n").trim().to_string())
    }
}

impl Default for PatchingCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl Collector for PatchingCollector {
    fn collect(&self, host: &Host<'_>) -> Result<String> {
        self.collect(host)
    }

    fn name(&self) -> &'static str {
        "patching"
    }
}
