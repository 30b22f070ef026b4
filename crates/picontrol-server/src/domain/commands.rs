//! The command whitelist.
//!
//! [`CommandName`] is the closed set of operations reachable from the
//! network.  Adding a command means adding a variant here and a handler in
//! the registry; nothing can be added at runtime.

/// Every command a client may invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandName {
    GpioOn,
    GpioOff,
    GpioToggle,
    GpioRead,
    SystemInfo,
    GetTemperature,
    GetMemory,
    GetDiskUsage,
    RunScript,
    ListProcesses,
    Ping,
    Reboot,
    Shutdown,
}

/// All whitelisted commands, in registry order.
pub const COMMAND_NAMES: [CommandName; 13] = [
    CommandName::GpioOn,
    CommandName::GpioOff,
    CommandName::GpioToggle,
    CommandName::GpioRead,
    CommandName::SystemInfo,
    CommandName::GetTemperature,
    CommandName::GetMemory,
    CommandName::GetDiskUsage,
    CommandName::RunScript,
    CommandName::ListProcesses,
    CommandName::Ping,
    CommandName::Reboot,
    CommandName::Shutdown,
];

impl CommandName {
    /// Wire name of the command.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GpioOn => "gpio_on",
            Self::GpioOff => "gpio_off",
            Self::GpioToggle => "gpio_toggle",
            Self::GpioRead => "gpio_read",
            Self::SystemInfo => "system_info",
            Self::GetTemperature => "get_temperature",
            Self::GetMemory => "get_memory",
            Self::GetDiskUsage => "get_disk_usage",
            Self::RunScript => "run_script",
            Self::ListProcesses => "list_processes",
            Self::Ping => "ping",
            Self::Reboot => "reboot",
            Self::Shutdown => "shutdown",
        }
    }

    /// Minimum number of positional arguments the command needs.
    ///
    /// GPIO commands fall back to the default pin, so only `run_script`
    /// requires an argument.
    pub const fn min_args(self) -> usize {
        match self {
            Self::RunScript => 1,
            _ => 0,
        }
    }
}

impl std::fmt::Display for CommandName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
