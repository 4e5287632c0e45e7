use rand::Rng;
use rand::distr::Alphanumeric;
use shared::TrackerId;

pub fn generate() -> TrackerId {
    generate_with(&mut rand::rng())
}

/// Draws each character independently and uniformly from `[A-Za-z0-9]`.
pub fn generate_with<R: Rng + ?Sized>(rng: &mut R) -> TrackerId {
    let id: String = (0..TrackerId::LEN)
        .map(|_| char::from(rng.sample(Alphanumeric)))
        .collect();
    TrackerId::from(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashMap;

    const ALPHABET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

    #[test]
    fn generated_ids_are_well_formed() {
        for _ in 0..1_000 {
            let id = generate();
            assert!(id.is_well_formed(), "bad tracker id: {}", id);
        }
    }

    #[test]
    fn symbols_are_uniform_per_position() {
        let mut rng = StdRng::seed_from_u64(0x7e57_1d5);
        let samples = 62_000usize;
        let mut counts: Vec<HashMap<char, usize>> = vec![HashMap::new(); TrackerId::LEN];

        for _ in 0..samples {
            let id = generate_with(&mut rng);
            for (pos, c) in id.as_str().chars().enumerate() {
                *counts[pos].entry(c).or_default() += 1;
            }
        }

        let p = 1.0 / 62.0;
        let expected = samples as f64 * p;
        let sigma = (samples as f64 * p * (1.0 - p)).sqrt();
        for (pos, position_counts) in counts.iter().enumerate() {
            assert_eq!(position_counts.len(), 62, "position {} missed symbols", pos);
            for symbol in ALPHABET.chars() {
                let seen = *position_counts.get(&symbol).unwrap_or(&0) as f64;
                assert!(
                    (seen - expected).abs() < 6.0 * sigma,
                    "symbol {} at position {} seen {} times, expected ~{}",
                    symbol,
                    pos,
                    seen,
                    expected
                );
            }
        }
    }
}
