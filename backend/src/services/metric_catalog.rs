// Metric Catalog
// Static lookup of which telemetry series each dashboard tab shows per node class

use crate::models::{GraphsTab, NodeClass};

const TOWER_OVERVIEW: &[&str] = &[
    "uptimetrx",
    "temperaturetrx",
    "temperaturecom",
    "subscribersactive",
    "subscribersattached",
];
const HOME_OVERVIEW: &[&str] = &[
    "uptimetrx",
    "temperaturetrx",
    "temperaturerfe",
    "subscribersactive",
    "subscribersattached",
];
const AMPLIFIER_OVERVIEW: &[&str] = &["uptimetrx", "temperaturectl", "temperaturerfe"];

const NETWORK: &[&str] = &["rrc", "rlc", "erab", "throughputuplink", "throughputdownlink"];

const TOWER_RESOURCES: &[&str] = &[
    "cputrxusage",
    "memorytrxused",
    "disktrxused",
    "cpucomusage",
    "memorycomused",
    "diskcomused",
    "powerlevel",
];
const HOME_RESOURCES: &[&str] = &["cputrxusage", "memorytrxused", "disktrxused", "powerlevel"];
const AMPLIFIER_RESOURCES: &[&str] = &["cpuctlused", "memoryctlused", "diskctlused", "powerlevel"];

const RADIO: &[&str] = &["txpower", "rxpower", "papower"];
const HOME_TAB: &[&str] = &["subscribersactive", "subscribersattached"];
const NODE_STATUS: &[&str] = &["uptimetrx"];

/// Ordered metric keys for a tab. Empty is a valid answer (e.g. radio on an amplifier).
pub fn resolve(node_class: NodeClass, tab: GraphsTab) -> &'static [&'static str] {
    match (node_class, tab) {
        (NodeClass::Tower, GraphsTab::Overview) => TOWER_OVERVIEW,
        (NodeClass::Home, GraphsTab::Overview) => HOME_OVERVIEW,
        (NodeClass::Amplifier, GraphsTab::Overview) => AMPLIFIER_OVERVIEW,

        (NodeClass::Tower | NodeClass::Home, GraphsTab::Network) => NETWORK,
        (NodeClass::Amplifier, GraphsTab::Network) => &[],

        (NodeClass::Tower, GraphsTab::Resources) => TOWER_RESOURCES,
        (NodeClass::Home, GraphsTab::Resources) => HOME_RESOURCES,
        (NodeClass::Amplifier, GraphsTab::Resources) => AMPLIFIER_RESOURCES,

        (NodeClass::Tower | NodeClass::Home, GraphsTab::Radio) => RADIO,
        (NodeClass::Amplifier, GraphsTab::Radio) => &[],

        (NodeClass::Tower | NodeClass::Home, GraphsTab::Home) => HOME_TAB,
        (NodeClass::Amplifier, GraphsTab::Home) => &[],

        (_, GraphsTab::NodeStatus) => NODE_STATUS,
    }
}

/// Display title for a metric key; unknown keys get an empty title
pub fn title(metric_key: &str) -> &'static str {
    match metric_key {
        "uptimetrx" => "Uptime TRX",
        "temperaturetrx" => "Temp. (TRX)",
        "temperaturerfe" => "Temp. (RFE)",
        "temperaturectl" => "Temp. (CTL)",
        "temperaturecom" => "Temp. (COM)",
        "subscribersactive" => "Active",
        "subscribersattached" => "Attached",
        "rrc" => "RRC CNX success",
        "rlc" => "RLS  drop rate",
        "erab" => "ERAB drop rate",
        "throughputuplink" => "Throughput (U/L)",
        "throughputdownlink" => "Throughput (D/L)",
        "cputrxusage" => "CPU-TRX",
        "memorytrxused" => "Memory-TRX",
        "disktrxused" => "DISK-TRX",
        "cpuctlused" => "CPU-CTL",
        "diskctlused" => "DISK-CTL",
        "memoryctlused" => "Memory-CTL",
        "cpucomusage" => "CPU-COM",
        "diskcomused" => "DISK-COM",
        "memorycomused" => "Memory-COM",
        "powerlevel" => "Power",
        "txpower" => "TX Power",
        "rxpower" => "RX Power",
        "papower" => "PA Power",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_CLASSES: [NodeClass; 3] = [NodeClass::Tower, NodeClass::Amplifier, NodeClass::Home];
    const ALL_TABS: [GraphsTab; 6] = [
        GraphsTab::Overview,
        GraphsTab::Network,
        GraphsTab::Radio,
        GraphsTab::Resources,
        GraphsTab::NodeStatus,
        GraphsTab::Home,
    ];

    #[test]
    fn test_tower_overview() {
        assert_eq!(
            resolve(NodeClass::Tower, GraphsTab::Overview),
            &["uptimetrx", "temperaturetrx", "temperaturecom", "subscribersactive", "subscribersattached"]
        );
    }

    #[test]
    fn test_amplifier_has_no_radio_metrics() {
        assert!(resolve(NodeClass::Amplifier, GraphsTab::Radio).is_empty());
        assert!(resolve(NodeClass::Amplifier, GraphsTab::Network).is_empty());
    }

    #[test]
    fn test_every_catalog_key_has_a_title() {
        for class in ALL_CLASSES {
            for tab in ALL_TABS {
                for key in resolve(class, tab) {
                    assert!(!title(key).is_empty(), "missing title for {}", key);
                }
            }
        }
    }

    #[test]
    fn test_keys_are_unique_per_tab() {
        for class in ALL_CLASSES {
            for tab in ALL_TABS {
                let keys = resolve(class, tab);
                let mut deduped = keys.to_vec();
                deduped.sort_unstable();
                deduped.dedup();
                assert_eq!(deduped.len(), keys.len(), "{:?}/{:?}", class, tab);
            }
        }
    }

    #[test]
    fn test_unknown_title_is_empty() {
        assert_eq!(title("uptimetrx"), "Uptime TRX");
        assert_eq!(title("not-a-metric"), "");
    }
}
