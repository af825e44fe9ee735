use std::path::PathBuf;

use super::collection_config::BoardSection;
use crate::constants::{UFS_BOOTDEVICE_PROPERTY, VENDOR_SHELL};

/// Board sections dumped after the modem pipeline, in report order.
pub fn default_board_sections() -> Vec<BoardSection> {
    let mut sections = vec![
        BoardSection::file("SoC serial number", "/sys/devices/soc0/serial_number"),
        BoardSection::file("CPU present", "/sys/devices/system/cpu/present"),
        BoardSection::file("CPU online", "/sys/devices/system/cpu/online"),
        BoardSection::file("UFS model", "/sys/block/sda/device/model"),
        BoardSection::file("UFS rev", "/sys/block/sda/device/rev"),
        BoardSection::file("UFS size", "/sys/block/sda/size"),
        BoardSection::Command {
            title: "UFS health".to_string(),
            argv: vec![
                VENDOR_SHELL.to_string(),
                "-c".to_string(),
                format!(
                    "for f in $(find /sys/devices/platform/soc/${{{}}}/health -type f); do if [[ -r $f && -f $f ]]; then echo --- $f; cat $f; echo ''; fi; done",
                    UFS_BOOTDEVICE_PROPERTY
                ),
            ],
            requires_property: Some(UFS_BOOTDEVICE_PROPERTY.to_string()),
            only_if_readable: None,
        },
        BoardSection::file("F2FS", "/sys/kernel/debug/f2fs/status"),
        BoardSection::file("INTERRUPTS", "/proc/interrupts"),
        BoardSection::file("Sleep Stats", "/sys/power/system_sleep/stats"),
        BoardSection::file("Power Management Stats", "/sys/power/rpmh_stats/master_stats"),
        BoardSection::file("WLAN Power Stats", "/d/wlan0/power_stats"),
        BoardSection::file("LL-Stats", "/d/wlan0/ll_stats"),
        BoardSection::file("ICNSS Stats", "/d/icnss/stats"),
        BoardSection::file("SMD Log", "/d/ipc_logging/smd/log"),
        BoardSection::shell(
            "ION HEAPS",
            "for d in $(ls -d /d/ion/*); do for f in $(ls $d); do echo --- $d/$f; cat $d/$f; done; done",
        ),
        BoardSection::file("dmabuf info", "/d/dma_buf/bufinfo"),
        BoardSection::shell(
            "Temperatures",
            "for f in `ls /sys/class/thermal` ; do type=`cat /sys/class/thermal/$f/type` ; temp=`cat /sys/class/thermal/$f/temp` ; echo \"$type: $temp\" ; done",
        ),
    ];

    for (label, cpu) in [("cpu0-1", "cpu0"), ("cpu2-3", "cpu2")] {
        sections.push(BoardSection::file(
            &format!("{} time-in-state", label),
            &format!("/sys/devices/system/cpu/{}/cpufreq/stats/time_in_state", cpu),
        ));
        sections.push(BoardSection::shell(
            &format!("{} cpuidle", label),
            &format!(
                "for d in $(ls -d /sys/devices/system/cpu/{}/cpuidle/state*); do echo \"$d: `cat $d/name` `cat $d/desc` `cat $d/time` `cat $d/usage`\"; done",
                cpu
            ),
        ));
    }

    sections.extend([
        BoardSection::file("MDP xlogs", "/data/vendor/display/mdp_xlog"),
        BoardSection::file("TCPM logs", "/d/tcpm/usbpd0"),
        BoardSection::file("PD Engine", "/d/pd_engine/usbpd0"),
        BoardSection::file("smblib-usb logs", "/d/ipc_logging/smblib/log"),
        BoardSection::file("ipc-local-ports", "/d/msm_ipc_router/dump_local_ports"),
        BoardSection::file("WLAN FW Log Symbol Table", "/vendor/firmware/Data.msc"),
        guarded_file("Synaptics touch firmware version", "/sys/android_touch/vendor", "/sys/android_touch"),
        guarded_file("Synaptics touch firmware config", "/sys/android_touch/config", "/sys/android_touch"),
        guarded_file("STM touch firmware config", "/sys/class/input/ftm4_touch/version", "/sys/class/input/ftm4_touch"),
        BoardSection::shell(
            "USB Device Descriptors",
            "cd /sys/bus/usb/devices/1-1 && cat product && cat bcdDevice; cat descriptors | od -t x1 -w16 -N96",
        ),
        BoardSection::shell("QSEE logs", "cat /d/tzdbg/qsee_log"),
    ]);

    sections
}

fn guarded_file(title: &str, path: &str, guard: &str) -> BoardSection {
    BoardSection::File {
        title: title.to_string(),
        path: PathBuf::from(path),
        only_if_readable: Some(PathBuf::from(guard)),
    }
}
