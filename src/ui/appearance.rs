use crate::ui::theme::ThemeMode;

/// Best-effort lookup of the desktop's light/dark preference. Returns `None`
/// when the platform gives no hint.
pub fn detect_preferred_mode() -> Option<ThemeMode> {
    detect_via_os_hint()
}

fn detect_via_os_hint() -> Option<ThemeMode> {
    #[cfg(target_os = "macos")]
    {
        use std::process::Command;
        // Prints "Dark" in dark mode; exits non-zero when the key is unset.
        let dark = Command::new("/usr/bin/defaults")
            .args(["read", "-g", "AppleInterfaceStyle"])
            .output()
            .map(|output| {
                output.status.success()
                    && String::from_utf8_lossy(&output.stdout)
                        .to_ascii_lowercase()
                        .contains("dark")
            })
            .unwrap_or(false);
        return Some(if dark { ThemeMode::Dark } else { ThemeMode::Light });
    }

    #[cfg(target_os = "windows")]
    {
        use winreg::enums::HKEY_CURRENT_USER;
        use winreg::RegKey;
        let hkcu = RegKey::predef(HKEY_CURRENT_USER);
        let personalize = hkcu
            .open_subkey("Software\\Microsoft\\Windows\\CurrentVersion\\Themes\\Personalize")
            .ok()?;
        let light: u32 = personalize.get_value("AppsUseLightTheme").ok()?;
        return Some(if light == 0 {
            ThemeMode::Dark
        } else {
            ThemeMode::Light
        });
    }

    #[cfg(target_os = "linux")]
    {
        gsettings_value("color-scheme")
            .and_then(|scheme| {
                if scheme.contains("prefer-dark") {
                    Some(ThemeMode::Dark)
                } else if scheme.contains("prefer-light") || scheme.contains("default") {
                    Some(ThemeMode::Light)
                } else {
                    None
                }
            })
            .or_else(|| {
                // Older GNOME: dark variants carry a "-dark" suffix
                gsettings_value("gtk-theme").map(|name| {
                    if name.contains("-dark") {
                        ThemeMode::Dark
                    } else {
                        ThemeMode::Light
                    }
                })
            })
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
    {
        None
    }
}

#[cfg(target_os = "linux")]
fn gsettings_value(key: &str) -> Option<String> {
    let output = std::process::Command::new("gsettings")
        .args(["get", "org.gnome.desktop.interface", key])
        .output()
        .ok()?;
    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).to_ascii_lowercase())
}
