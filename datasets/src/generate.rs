//! Synthetic IoT traffic tables for tests and demos

use rand::seq::SliceRandom;
use rand::Rng;

use crate::table::RawTable;

/// Label of malicious flows
pub const ATTACK: &str = "malicious";
/// Label of regular flows
pub const NORMAL: &str = "benign";

const SERVICES: &[&str] = &["coap", "http", "mqtt"];

/// Generate a labelled traffic table with the layout of the IoT captures
///
/// Exactly `round(attack_ratio * n)` rows are attacks. Attacks send packets at a higher rate,
/// keep connections shorter and favour `http`, but the ranges overlap so the task is not
/// trivially separable. The table also carries the `src`, `dst` and `Protocol` identifier
/// columns and a `True`/`False` column without any signal.
///
/// ```rust
/// use ids_forest_datasets::generate::intrusion_traffic;
/// use rand::{rngs::StdRng, SeedableRng};
///
/// let table = intrusion_traffic(100, 0.3, &mut StdRng::seed_from_u64(1));
/// assert_eq!(table.nrows(), 100);
/// ```
pub fn intrusion_traffic(n: usize, attack_ratio: f64, rng: &mut impl Rng) -> RawTable {
    let header = [
        "src",
        "dst",
        "Protocol",
        "packet_rate",
        "duration",
        "service",
        "retransmitted",
        "label",
    ]
    .iter()
    .map(|x| x.to_string())
    .collect();

    let n_attack = (attack_ratio.clamp(0.0, 1.0) * n as f64).round() as usize;
    let mut is_attack = (0..n).map(|i| i < n_attack).collect::<Vec<_>>();
    is_attack.shuffle(rng);

    let rows = is_attack
        .into_iter()
        .map(|attack| {
            let (rate, duration, service) = if attack {
                let service = if rng.gen_bool(0.6) {
                    "http"
                } else {
                    SERVICES[rng.gen_range(0..SERVICES.len())]
                };
                (rng.gen_range(55.0..120.0), rng.gen_range(0.0..3.0), service)
            } else {
                (
                    rng.gen_range(5.0..70.0),
                    rng.gen_range(1.0..10.0),
                    SERVICES[rng.gen_range(0..SERVICES.len())],
                )
            };

            vec![
                format!("192.168.1.{}", rng.gen_range(2..255)),
                format!("10.0.0.{}", rng.gen_range(2..20)),
                if rng.gen_bool(0.5) { "TCP" } else { "UDP" }.to_string(),
                format!("{:.3}", rate),
                format!("{:.3}", duration),
                service.to_string(),
                if rng.gen_bool(0.2) { "True" } else { "False" }.to_string(),
                if attack { ATTACK } else { NORMAL }.to_string(),
            ]
        })
        .collect();

    RawTable::new(header, rows)
}
