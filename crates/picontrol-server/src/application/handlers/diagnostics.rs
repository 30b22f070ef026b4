//! Host diagnostics: system info, temperature, memory, disk and processes.
//!
//! Each handler runs a fixed, non-configurable program; client arguments are
//! ignored.  Optional data sources degrade to a placeholder instead of
//! failing the whole command.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::application::host::HostOps;
use crate::application::registry::{CommandHandler, HandlerError};

const DEVICE_MODEL_PATH: &str = "/proc/device-tree/model";
const CPUINFO_PATH: &str = "/proc/cpuinfo";
const THERMAL_ZONE_PATH: &str = "/sys/class/thermal/thermal_zone0/temp";

/// Leading lines of `ps aux` output returned by `list_processes` (header
/// plus 20 processes).
pub const PROCESS_LIST_LINES: usize = 21;

const UNKNOWN: &str = "Unknown";

#[derive(Debug, Serialize)]
struct SystemInfoReport {
    model: String,
    system: String,
    uptime: String,
    cpu: String,
}

/// `system_info`: board model, kernel, uptime and CPU as pretty JSON.
pub struct SystemInfo {
    host: Arc<dyn HostOps>,
}

impl SystemInfo {
    pub fn new(host: Arc<dyn HostOps>) -> Self {
        Self { host }
    }

    async fn model(&self) -> String {
        match self.host.read_file(Path::new(DEVICE_MODEL_PATH)).await {
            // Device-tree strings are NUL-terminated.
            Ok(model) => model.trim_end_matches('\0').trim().to_string(),
            Err(e) => {
                debug!("board model unavailable: {e}");
                UNKNOWN.to_string()
            }
        }
    }

    async fn cpu(&self) -> String {
        let cpuinfo = match self.host.read_file(Path::new(CPUINFO_PATH)).await {
            Ok(cpuinfo) => cpuinfo,
            Err(e) => {
                debug!("cpuinfo unavailable: {e}");
                return UNKNOWN.to_string();
            }
        };
        cpu_model(&cpuinfo).unwrap_or(UNKNOWN).to_string()
    }
}

/// Extracts the value of the first `model name` line of `/proc/cpuinfo`.
fn cpu_model(cpuinfo: &str) -> Option<&str> {
    cpuinfo
        .lines()
        .find(|line| line.contains("model name"))
        .and_then(|line| line.split(':').nth(1))
        .map(str::trim)
}

#[async_trait]
impl CommandHandler for SystemInfo {
    async fn handle(&self, _params: &[Value]) -> Result<String, HandlerError> {
        let system = self.host.run("uname", &["-a"]).await?;
        let uptime = self.host.run("uptime", &[]).await?;

        let report = SystemInfoReport {
            model: self.model().await,
            system: system.stdout.trim().to_string(),
            uptime: uptime.stdout.trim().to_string(),
            cpu: self.cpu().await,
        };
        Ok(serde_json::to_string_pretty(&report)?)
    }
}

/// `get_temperature`: `vcgencmd` reading plus the thermal-zone CPU value.
pub struct Temperature {
    host: Arc<dyn HostOps>,
}

impl Temperature {
    pub fn new(host: Arc<dyn HostOps>) -> Self {
        Self { host }
    }
}

/// Formats a thermal-zone reading (millidegrees Celsius).
fn format_millidegrees(raw: &str) -> Option<String> {
    let milli: i64 = raw.trim().parse().ok()?;
    Some(format!("CPU: {:.1}°C", milli as f64 / 1000.0))
}

#[async_trait]
impl CommandHandler for Temperature {
    async fn handle(&self, _params: &[Value]) -> Result<String, HandlerError> {
        let mut parts = Vec::new();

        match self.host.run("vcgencmd", &["measure_temp"]).await {
            Ok(output) if !output.stdout.trim().is_empty() => {
                parts.push(output.stdout.trim().to_string())
            }
            Ok(_) => debug!("vcgencmd printed nothing"),
            Err(e) => debug!("vcgencmd unavailable: {e}"),
        }

        match self.host.read_file(Path::new(THERMAL_ZONE_PATH)).await {
            Ok(raw) => parts.extend(format_millidegrees(&raw)),
            Err(e) => debug!("thermal zone unavailable: {e}"),
        }

        if parts.is_empty() {
            Ok("Temperature unavailable".to_string())
        } else {
            Ok(parts.join("\n"))
        }
    }
}

/// `get_memory`: `free -h`.
pub struct Memory {
    host: Arc<dyn HostOps>,
}

impl Memory {
    pub fn new(host: Arc<dyn HostOps>) -> Self {
        Self { host }
    }
}

#[async_trait]
impl CommandHandler for Memory {
    async fn handle(&self, _params: &[Value]) -> Result<String, HandlerError> {
        Ok(self.host.run("free", &["-h"]).await?.stdout)
    }
}

/// `get_disk_usage`: `df -h`.
pub struct DiskUsage {
    host: Arc<dyn HostOps>,
}

impl DiskUsage {
    pub fn new(host: Arc<dyn HostOps>) -> Self {
        Self { host }
    }
}

#[async_trait]
impl CommandHandler for DiskUsage {
    async fn handle(&self, _params: &[Value]) -> Result<String, HandlerError> {
        Ok(self.host.run("df", &["-h"]).await?.stdout)
    }
}

/// `list_processes`: the first [`PROCESS_LIST_LINES`] lines of `ps aux`.
pub struct ListProcesses {
    host: Arc<dyn HostOps>,
}

impl ListProcesses {
    pub fn new(host: Arc<dyn HostOps>) -> Self {
        Self { host }
    }
}

#[async_trait]
impl CommandHandler for ListProcesses {
    async fn handle(&self, _params: &[Value]) -> Result<String, HandlerError> {
        let output = self.host.run("ps", &["aux"]).await?;
        Ok(output
            .stdout
            .split('\n')
            .take(PROCESS_LIST_LINES)
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::host::ProcessOutput;
    use crate::infrastructure::host::MockHost;

    fn shared(host: MockHost) -> (Arc<MockHost>, Arc<dyn HostOps>) {
        let host = Arc::new(host);
        let dyn_host: Arc<dyn HostOps> = Arc::clone(&host) as Arc<dyn HostOps>;
        (host, dyn_host)
    }

    #[tokio::test]
    async fn test_system_info_reports_all_fields_as_json() {
        // Arrange
        let (_, host) = shared(
            MockHost::new()
                .with_program("uname -a", ProcessOutput::ok("Linux raspberrypi 6.1.21\n"))
                .with_program("uptime", ProcessOutput::ok(" 10:00:00 up 3 days\n"))
                .with_file(DEVICE_MODEL_PATH, "Raspberry Pi 4 Model B Rev 1.4\0")
                .with_file(CPUINFO_PATH, "processor\t: 0\nmodel name\t: ARMv7 Processor rev 3 (v7l)\n"),
        );

        // Act
        let text = SystemInfo::new(host).handle(&[]).await.unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();

        // Assert
        assert_eq!(value["model"], "Raspberry Pi 4 Model B Rev 1.4");
        assert_eq!(value["system"], "Linux raspberrypi 6.1.21");
        assert_eq!(value["uptime"], "10:00:00 up 3 days");
        assert_eq!(value["cpu"], "ARMv7 Processor rev 3 (v7l)");
        assert!(text.contains('\n'), "result is pretty-printed");
    }

    #[tokio::test]
    async fn test_system_info_degrades_missing_model_and_cpu() {
        let (_, host) = shared(
            MockHost::new()
                .with_program("uname -a", ProcessOutput::ok("Linux box\n"))
                .with_program("uptime", ProcessOutput::ok("up\n"))
                .with_file(CPUINFO_PATH, "processor\t: 0\n"),
        );

        let text = SystemInfo::new(host).handle(&[]).await.unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();

        assert_eq!(value["model"], "Unknown");
        assert_eq!(value["cpu"], "Unknown");
    }

    #[tokio::test]
    async fn test_system_info_propagates_missing_uname() {
        let (_, host) = shared(MockHost::new());
        let err = SystemInfo::new(host).handle(&[]).await.unwrap_err();
        assert!(err.to_string().contains("uname"), "{err}");
    }

    #[tokio::test]
    async fn test_temperature_combines_both_sources() {
        let (_, host) = shared(
            MockHost::new()
                .with_program("vcgencmd measure_temp", ProcessOutput::ok("temp=48.3'C\n"))
                .with_file(THERMAL_ZONE_PATH, "47860\n"),
        );
        let text = Temperature::new(host).handle(&[]).await.unwrap();
        assert_eq!(text, "temp=48.3'C\nCPU: 47.9°C");
    }

    #[tokio::test]
    async fn test_temperature_without_vcgencmd_uses_thermal_zone() {
        let (_, host) = shared(MockHost::new().with_file(THERMAL_ZONE_PATH, "51000"));
        let text = Temperature::new(host).handle(&[]).await.unwrap();
        assert_eq!(text, "CPU: 51.0°C");
    }

    #[tokio::test]
    async fn test_temperature_without_any_source() {
        let (_, host) = shared(MockHost::new());
        let text = Temperature::new(host).handle(&[]).await.unwrap();
        assert_eq!(text, "Temperature unavailable");
    }

    #[tokio::test]
    async fn test_memory_and_disk_return_stdout_verbatim() {
        let (_, host) = shared(
            MockHost::new()
                .with_program("free -h", ProcessOutput::ok("Mem: 3.7Gi\n"))
                .with_program("df -h", ProcessOutput::ok("/dev/root 29G\n")),
        );
        assert_eq!(Memory::new(Arc::clone(&host)).handle(&[]).await.unwrap(), "Mem: 3.7Gi\n");
        assert_eq!(DiskUsage::new(host).handle(&[]).await.unwrap(), "/dev/root 29G\n");
    }

    #[tokio::test]
    async fn test_list_processes_truncates_to_21_lines() {
        // Arrange: header plus 40 process lines
        let mut stdout = String::from("USER PID %CPU COMMAND\n");
        for pid in 1..=40 {
            stdout.push_str(&format!("root {pid} 0.0 proc{pid}\n"));
        }
        let (mock, host) = shared(MockHost::new().with_program("ps aux", ProcessOutput::ok(stdout)));

        // Act
        let text = ListProcesses::new(host).handle(&[]).await.unwrap();

        // Assert
        let lines: Vec<_> = text.split('\n').collect();
        assert_eq!(lines.len(), PROCESS_LIST_LINES);
        assert_eq!(lines[0], "USER PID %CPU COMMAND");
        assert_eq!(lines[20], "root 20 0.0 proc20");
        assert_eq!(mock.calls(), vec!["ps aux"]);
    }

    #[tokio::test]
    async fn test_list_processes_short_output_is_unchanged() {
        let (_, host) = shared(MockHost::new().with_program("ps aux", ProcessOutput::ok("USER PID\nroot 1\n")));
        let text = ListProcesses::new(host).handle(&[]).await.unwrap();
        assert_eq!(text, "USER PID\nroot 1\n");
    }

    #[test]
    fn test_cpu_model_takes_first_model_name_line() {
        let info = "model name\t: A\nmodel name\t: B\n";
        assert_eq!(cpu_model(info), Some("A"));
        assert_eq!(cpu_model("Hardware : BCM2835"), None);
    }
}
