use gravity_field_core::config::FieldConfig;
use gravity_field_core::emitter::{Emitter, EmitterParams};
use gravity_field_core::field::PotentialField;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use std::time::Instant;

fn create_wells(config: &FieldConfig, count: u32, seed: u64) -> Vec<Emitter> {
    let mut rng = ChaCha12Rng::seed_from_u64(seed);
    (0..count)
        .map(|id| {
            let params = EmitterParams {
                pulse_amplitude: rng.random_range(0.0..4.0),
                pulse_period: rng.random_range(2.0..8.0),
                ..EmitterParams::new(
                    [
                        rng.random::<f64>() * config.width,
                        rng.random::<f64>() * config.height,
                    ],
                    rng.random_range(5.0..20.0),
                    rng.random_range(60.0..160.0),
                    rng.random_range(1.0..3.0),
                    rng.random_range(100.0..200.0),
                )
            };
            Emitter::new(id, params)
        })
        .collect()
}

fn main() {
    let config = FieldConfig {
        width: 3840.0,
        height: 2160.0,
        resolution: 4.0,
        baseline: -1.2,
    };
    let well_count = 32;
    let wells = create_wells(&config, well_count, 42);
    let mut serial = PotentialField::new(config);
    let mut parallel = PotentialField::new(config);
    println!(
        "Benchmarking rebuild on a {}x{} grid with {} wells",
        serial.columns(),
        serial.rows(),
        well_count
    );

    let rebuilds = 5;

    let start = Instant::now();
    for _ in 0..rebuilds {
        serial.rebuild(&wells);
    }
    let duration_serial = start.elapsed();
    println!("Time for {} serial rebuilds: {:?}", rebuilds, duration_serial);
    println!("Avg per rebuild (serial): {:?}", duration_serial / rebuilds);

    let start = Instant::now();
    for _ in 0..rebuilds {
        parallel.rebuild_par(&wells);
    }
    let duration_parallel = start.elapsed();
    println!("Time for {} parallel rebuilds: {:?}", rebuilds, duration_parallel);
    println!("Avg per rebuild (parallel): {:?}", duration_parallel / rebuilds);

    let identical = serial.values() == parallel.values()
        && serial.potential_range() == parallel.potential_range();
    println!("Outputs identical: {}", identical);
    let (min, max) = serial.potential_range();
    println!("Potential range: [{min:.4}, {max:.4}]");
}
