//! Variation operators: single-point crossover and bit-flip mutation.
//!
//! Both operators draw from a caller-supplied random generator, so a trial that owns
//! its generator is fully reproducible from its seed.
//!
//! Passing genomes of different lengths, or empty genomes, is a programming error and
//! panics at the call site.

use rand::Rng;

use crate::genome::Genome;

/// Recombines two parents with probability `rate`.
///
/// One uniform draw decides whether recombination happens. If it does and the
/// genomes have at least two bits, a cut point is drawn uniformly from
/// `[1, len - 1]` and the tails after the cut are swapped. Otherwise the children
/// are independent copies of the parents. Genomes of length 1 are never cut.
///
/// # Panics
///
/// Panics if the parents differ in length or are empty.
///
/// # Examples
///
/// ```
/// use onemax_ga::{genome::Genome, variation};
/// use rand::SeedableRng as _;
/// use rand_pcg::Pcg64;
///
/// let mut rng = Pcg64::seed_from_u64(3);
/// let p1 = Genome::from([1, 1, 1, 1]);
/// let p2 = Genome::from([0, 0, 0, 0]);
///
/// let (c1, c2) = variation::crossover(&p1, &p2, 0.0, &mut rng);
/// assert_eq!((c1, c2), (p1, p2));
/// ```
pub fn crossover<R>(parent1: &Genome, parent2: &Genome, rate: f64, rng: &mut R) -> (Genome, Genome)
where
    R: Rng + ?Sized,
{
    assert_eq!(
        parent1.len(),
        parent2.len(),
        "crossover parents must have equal length"
    );
    assert!(!parent1.is_empty(), "crossover parents must not be empty");

    let len = parent1.len();
    if rng.random::<f64>() < rate && len >= 2 {
        let cut = rng.random_range(1..len);
        (
            splice(parent1, parent2, cut),
            splice(parent2, parent1, cut),
        )
    } else {
        (parent1.clone(), parent2.clone())
    }
}

/// Takes the bits before `cut` from `head` and the rest from `tail`.
fn splice(head: &Genome, tail: &Genome, cut: usize) -> Genome {
    let bits = head.bits()[..cut]
        .iter()
        .chain(&tail.bits()[cut..])
        .copied()
        .collect();
    Genome::from_bits(bits)
}

/// Flips each bit independently with probability `rate`, in place.
///
/// Returns the same genome for call-site convenience. A rate of `0.0` leaves the
/// genome unchanged and a rate of `1.0` inverts every bit.
///
/// # Examples
///
/// ```
/// use onemax_ga::{genome::Genome, variation};
/// use rand::SeedableRng as _;
/// use rand_pcg::Pcg64;
///
/// let mut rng = Pcg64::seed_from_u64(5);
/// let mut genome = Genome::from([0, 0, 0, 0]);
/// variation::mutate(&mut genome, 1.0, &mut rng);
/// assert_eq!(genome, Genome::from([1, 1, 1, 1]));
/// ```
pub fn mutate<'a, R>(genome: &'a mut Genome, rate: f64, rng: &mut R) -> &'a mut Genome
where
    R: Rng + ?Sized,
{
    for bit in genome.bits_mut() {
        if rng.random::<f64>() < rate {
            *bit = !*bit;
        }
    }
    genome
}
