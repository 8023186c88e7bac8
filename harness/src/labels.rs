//! Label scheme binding Docker resources to a test identity
//!
//! Every network, container, and volume owned by a test carries
//! [`CLEANUP_LABEL`] with the test name as its value. All list and prune
//! operations filter on that pair, which is the whole of the cross-test
//! isolation story: two concurrently running tests never see each other's
//! resources.

use rand::Rng;

/// Docker label key targeted by setup when it cleans up resources.
///
/// "ictest" would be a better name, but resources created by earlier
/// versions carry "ibc-test", and changing the key would orphan their
/// leftovers and break the eager reap on the next run. New label keys should
/// use the reverse DNS format under [`LABEL_PREFIX`] instead.
pub const CLEANUP_LABEL: &str = "ibc-test";

/// Reverse DNS namespace for ictest Docker labels.
pub const LABEL_PREFIX: &str = "dev.ictest.";

/// Indicates the logical node owning a particular object (probably a volume).
/// Lives under [`LABEL_PREFIX`].
pub const NODE_OWNER_LABEL: &str = "dev.ictest.node-owner";

/// Prefix for per-test Docker network names.
pub const DOCKER_PREFIX: &str = "ictest";

/// `label` filter value selecting resources owned by `test_name`.
pub fn cleanup_label_filter(test_name: &str) -> String {
    format!("{CLEANUP_LABEL}={test_name}")
}

/// Name for a fresh per-test network: `ictest-<8 random lowercase letters>`.
pub fn random_network_name() -> String {
    format!("{DOCKER_PREFIX}-{}", random_lower_string(8))
}

/// Random string of lowercase ASCII letters.
pub fn random_lower_string(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len).map(|_| rng.gen_range(b'a'..=b'z') as char).collect()
}
