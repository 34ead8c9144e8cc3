use lazy_static::lazy_static;
use std::collections::HashMap;

/// Regions where network volumes (and therefore orders) can be placed.
pub const DATACENTERS: [&str; 5] = ["US-KS-2", "US-GA-1", "EU-RO-1", "EU-SE-1", "CA-MTL-1"];

pub fn is_supported_datacenter(datacenter_id: &str) -> bool {
    DATACENTERS.contains(&datacenter_id)
}

// keys are lowercase
const GPU_ALIASES: &[(&str, &str)] = &[
    // tiers
    ("starter", "NVIDIA GeForce RTX 4090"),
    ("standard", "NVIDIA RTX A6000"),
    ("performance", "NVIDIA A100 80GB PCIe"),
    ("enterprise", "NVIDIA H100 80GB HBM3"),
    // shorthands
    ("3090", "NVIDIA GeForce RTX 3090"),
    ("rtx 3090", "NVIDIA GeForce RTX 3090"),
    ("4090", "NVIDIA GeForce RTX 4090"),
    ("rtx 4090", "NVIDIA GeForce RTX 4090"),
    ("a5000", "NVIDIA RTX A5000"),
    ("rtx a5000", "NVIDIA RTX A5000"),
    ("a6000", "NVIDIA RTX A6000"),
    ("rtx a6000", "NVIDIA RTX A6000"),
    ("a40", "NVIDIA A40"),
    ("l40", "NVIDIA L40"),
    ("l40s", "NVIDIA L40S"),
    ("a100", "NVIDIA A100 80GB PCIe"),
    ("a100 pcie", "NVIDIA A100 80GB PCIe"),
    ("a100 sxm", "NVIDIA A100-SXM4-80GB"),
    ("h100", "NVIDIA H100 80GB HBM3"),
    ("h100 sxm", "NVIDIA H100 80GB HBM3"),
    ("h100 pcie", "NVIDIA H100 PCIe"),
    ("h100 nvl", "NVIDIA H100 NVL"),
    ("h200", "NVIDIA H200"),
];

lazy_static! {
    static ref GPU_LOOKUP: HashMap<&'static str, &'static str> =
        GPU_ALIASES.iter().copied().collect();
}

/// Maps a tier label or shorthand to the provider's GPU type id. Input that
/// matches nothing is returned as given.
pub fn normalize_gpu_type(gpu_type: &str) -> String {
    let key = gpu_type.trim().to_lowercase();

    match GPU_LOOKUP.get(key.as_str()) {
        Some(canonical) => canonical.to_string(),
        None => gpu_type.to_string(),
    }
}

pub fn aliases_for(gpu_type_id: &str) -> Vec<String> {
    let mut aliases: Vec<String> = GPU_ALIASES
        .iter()
        .filter(|(_, canonical)| *canonical == gpu_type_id)
        .map(|(alias, _)| alias.to_string())
        .collect();

    aliases.sort();

    aliases
}
