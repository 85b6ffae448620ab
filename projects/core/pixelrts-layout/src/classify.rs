//! Name and size based placement heuristics.

use crate::block::AccessFrequency;
use crate::zone::Zone;

const KERNEL: &[&str] = &["kernel", "vmlinuz", "system.bin", "core.elf"];
const BOOT: &[&str] = &["init", "boot", "startup", "/sbin/"];
const LIBRARIES: &[&str] = &["libc.so", "libm.so", "libpthread", "/lib/", "/lib64/"];
const SHELL_TOOLS: &[&str] = &["bash", "sh", "zsh", "vim", "nano", "ls", "cat"];
const APPLICATIONS: &[&str] = &["/usr/bin/", ".py", ".js"];
const CONFIG: &[&str] = &[".conf", ".cfg", ".ini", ".yaml", ".json", "/etc/"];
const MODELS: &[&str] = &[".model", ".gguf", ".bin", ".safetensors", "/models/"];
const ARCHIVES: &[&str] = &[".log", ".bak", ".old", ".tar", ".gz", ".zip", "/archive/", "/backup/"];

/// Picks a zone and access frequency for a file.
///
/// Name patterns are checked in priority order (kernel, boot, libraries, shell tools,
/// applications, configuration, models, archives). Shell tools match on the file name only so
/// that short names such as `sh` do not capture unrelated paths. Files matching nothing fall back
/// to their size: under 4 KiB is `WARM`, under 64 KiB `TEMPERATE`, anything larger `COOL`.
pub fn classify_file(name: &str, size: u64) -> (Zone, AccessFrequency) {
    let name = name.to_ascii_lowercase();
    let base_name = name.rsplit('/').next().unwrap_or(&name);
    let contains_any = |patterns: &[&str]| patterns.iter().any(|p| name.contains(p));

    if contains_any(KERNEL) {
        (Zone::Hot, AccessFrequency::Critical)
    } else if contains_any(BOOT) {
        (Zone::Hot, AccessFrequency::High)
    } else if contains_any(LIBRARIES) {
        (Zone::Warm, AccessFrequency::High)
    } else if SHELL_TOOLS.contains(&base_name)
        || (name.contains("/bin/") && !name.contains("/usr/bin/"))
    {
        (Zone::Warm, AccessFrequency::Medium)
    } else if contains_any(APPLICATIONS) {
        (Zone::Temperate, AccessFrequency::Medium)
    } else if contains_any(CONFIG) {
        (Zone::Temperate, AccessFrequency::Low)
    } else if contains_any(MODELS) {
        (Zone::Cool, AccessFrequency::Low)
    } else if contains_any(ARCHIVES) {
        (Zone::Cold, AccessFrequency::Rare)
    } else if size < 4096 {
        (Zone::Warm, AccessFrequency::Medium)
    } else if size < 65536 {
        (Zone::Temperate, AccessFrequency::Medium)
    } else {
        (Zone::Cool, AccessFrequency::Low)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("vmlinuz", 2 << 20, Zone::Hot, AccessFrequency::Critical)]
    #[case("/boot/kernel.img", 1 << 20, Zone::Hot, AccessFrequency::Critical)]
    #[case("initrd.img", 1 << 20, Zone::Hot, AccessFrequency::High)]
    #[case("/sbin/mount", 1000, Zone::Hot, AccessFrequency::High)]
    #[case("libc.so", 200 << 10, Zone::Warm, AccessFrequency::High)]
    #[case("/usr/lib/libz.so.1", 90_000, Zone::Warm, AccessFrequency::High)]
    #[case("/bin/bash", 1 << 20, Zone::Warm, AccessFrequency::Medium)]
    #[case("cat", 50_000, Zone::Warm, AccessFrequency::Medium)]
    #[case("/bin/mkdir", 50_000, Zone::Warm, AccessFrequency::Medium)]
    #[case("/usr/bin/python3", 5_000_000, Zone::Temperate, AccessFrequency::Medium)]
    #[case("tools/flash.py", 3_000, Zone::Temperate, AccessFrequency::Medium)]
    #[case("/etc/hosts", 300, Zone::Temperate, AccessFrequency::Low)]
    #[case("settings.yaml", 300, Zone::Temperate, AccessFrequency::Low)]
    #[case("weights.gguf", 1 << 30, Zone::Cool, AccessFrequency::Low)]
    #[case("app.log", 50 << 10, Zone::Cold, AccessFrequency::Rare)]
    #[case("/backup/photos", 10, Zone::Cold, AccessFrequency::Rare)]
    #[case("readme", 100, Zone::Warm, AccessFrequency::Medium)]
    #[case("readme", 10_000, Zone::Temperate, AccessFrequency::Medium)]
    #[case("readme", 100_000, Zone::Cool, AccessFrequency::Low)]
    fn classification(
        #[case] name: &str,
        #[case] size: u64,
        #[case] zone: Zone,
        #[case] frequency: AccessFrequency,
    ) {
        assert_eq!(classify_file(name, size), (zone, frequency));
    }

    #[test]
    fn shell_names_do_not_match_substrings() {
        // "sh" and "ls" appear inside these names but they are not shell tools.
        assert_eq!(
            classify_file("photos/fish.tar", 10),
            (Zone::Cold, AccessFrequency::Rare)
        );
        assert_eq!(
            classify_file("Models/tools.safetensors", 10),
            (Zone::Cool, AccessFrequency::Low)
        );
    }

    #[test]
    fn matching_ignores_case() {
        assert_eq!(classify_file("VMLINUZ", 1), (Zone::Hot, AccessFrequency::Critical));
    }
}
