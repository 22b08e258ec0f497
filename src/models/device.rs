// Netwatch - Device Types
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Device type names and mobile network classification.

/// Custom device type name for modems.
pub const DEVICE_MODEM: &str = "modem";

/// Map an `NMDeviceType` value to the short name shown to users.
pub fn custom_device_type(device_type: u32) -> &'static str {
    match device_type {
        1 => "wired",
        2 => "wireless",
        5 => "bluetooth",
        6 => "olpc-mesh",
        7 => "wimax",
        8 => DEVICE_MODEM,
        9 => "infiniband",
        10 => "bond",
        11 => "vlan",
        12 => "adsl",
        13 => "bridge",
        14 => "generic",
        15 => "team",
        16 => "tun",
        29 => "wireguard",
        30 => "wifi-p2p",
        _ => "unknown",
    }
}

/// `NMDeviceType` values that expose the wired interface.
pub fn is_wired_type(device_type: u32) -> bool {
    device_type == 1
}

/// `NMDeviceType` values that expose the wireless interface.
pub fn is_wireless_type(device_type: u32) -> bool {
    device_type == 2
}

// MMModemAccessTechnology bits
const MM_ACCESS_GSM: u32 = 1 << 1;
const MM_ACCESS_GSM_COMPACT: u32 = 1 << 2;
const MM_ACCESS_GPRS: u32 = 1 << 3;
const MM_ACCESS_EDGE: u32 = 1 << 4;
const MM_ACCESS_UMTS: u32 = 1 << 5;
const MM_ACCESS_HSDPA: u32 = 1 << 6;
const MM_ACCESS_HSUPA: u32 = 1 << 7;
const MM_ACCESS_HSPA: u32 = 1 << 8;
const MM_ACCESS_HSPA_PLUS: u32 = 1 << 9;
const MM_ACCESS_1XRTT: u32 = 1 << 10;
const MM_ACCESS_EVDO0: u32 = 1 << 11;
const MM_ACCESS_EVDOA: u32 = 1 << 12;
const MM_ACCESS_EVDOB: u32 = 1 << 13;
const MM_ACCESS_LTE: u32 = 1 << 14;
const MM_ACCESS_5GNR: u32 = 1 << 15;

/// Collapse a ModemManager access technology mask into a generation label.
///
/// The best technology in the mask wins; an empty mask gives an empty string.
pub fn mobile_network_type(access_technologies: u32) -> &'static str {
    let has = |bits: u32| access_technologies & bits != 0;
    if has(MM_ACCESS_5GNR) {
        "5G"
    } else if has(MM_ACCESS_LTE) {
        "4G"
    } else if has(
        MM_ACCESS_UMTS
            | MM_ACCESS_HSDPA
            | MM_ACCESS_HSUPA
            | MM_ACCESS_HSPA
            | MM_ACCESS_HSPA_PLUS
            | MM_ACCESS_EVDO0
            | MM_ACCESS_EVDOA
            | MM_ACCESS_EVDOB,
    ) {
        "3G"
    } else if has(MM_ACCESS_GSM | MM_ACCESS_GSM_COMPACT | MM_ACCESS_GPRS | MM_ACCESS_EDGE | MM_ACCESS_1XRTT) {
        "2G"
    } else {
        ""
    }
}

/// Format a link speed in Mb/s; zero means unknown.
pub fn format_speed(mbps: u32) -> String {
    if mbps == 0 {
        String::new()
    } else {
        format!("{} Mb/s", mbps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_type_names() {
        assert_eq!(custom_device_type(1), "wired");
        assert_eq!(custom_device_type(2), "wireless");
        assert_eq!(custom_device_type(8), DEVICE_MODEM);
        assert_eq!(custom_device_type(999), "unknown");
    }

    #[test]
    fn test_mobile_network_type() {
        assert_eq!(mobile_network_type(0), "");
        assert_eq!(mobile_network_type(MM_ACCESS_GPRS), "2G");
        assert_eq!(mobile_network_type(MM_ACCESS_EDGE | MM_ACCESS_HSPA), "3G");
        assert_eq!(mobile_network_type(MM_ACCESS_LTE | MM_ACCESS_UMTS), "4G");
        assert_eq!(mobile_network_type(MM_ACCESS_5GNR | MM_ACCESS_LTE), "5G");
    }

    #[test]
    fn test_format_speed() {
        assert_eq!(format_speed(0), "");
        assert_eq!(format_speed(1000), "1000 Mb/s");
    }
}
