//! Bit-vector individuals and populations.
//!
//! A [`Genome`] is a fixed-length sequence of bits. Its length is chosen when it is
//! created and never changes afterwards; the variation operators in
//! [`variation`](crate::variation) either flip bits in place or build new genomes
//! of the same length.
//!
//! A [`Population`] is an ordered collection of genomes that all share one length.
//! The GA engine builds a fresh population every generation, so no genome outlives
//! the generation it was created in.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// A fixed-length bit vector representing one candidate solution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Genome {
    bits: Vec<bool>,
}

impl Genome {
    /// Creates a genome from explicit bits.
    #[must_use]
    pub fn from_bits(bits: Vec<bool>) -> Self {
        Self { bits }
    }

    /// Creates a genome where each bit is drawn uniformly from `{0, 1}`.
    ///
    /// # Examples
    ///
    /// ```
    /// use onemax_ga::genome::Genome;
    /// use rand::SeedableRng as _;
    /// use rand_pcg::Pcg64;
    ///
    /// let mut rng = Pcg64::seed_from_u64(7);
    /// let genome = Genome::random(&mut rng, 16);
    /// assert_eq!(genome.len(), 16);
    /// ```
    pub fn random<R>(rng: &mut R, len: usize) -> Self
    where
        R: Rng + ?Sized,
    {
        Self {
            bits: (0..len).map(|_| rng.random_bool(0.5)).collect(),
        }
    }

    /// Creates a genome of `len` zeros.
    #[must_use]
    pub fn zeros(len: usize) -> Self {
        Self {
            bits: vec![false; len],
        }
    }

    /// Creates a genome of `len` ones (the OneMax optimum).
    #[must_use]
    pub fn ones(len: usize) -> Self {
        Self {
            bits: vec![true; len],
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    #[must_use]
    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    /// Number of set bits.
    #[must_use]
    pub fn count_ones(&self) -> usize {
        self.bits.iter().filter(|b| **b).count()
    }

    pub(crate) fn bits_mut(&mut self) -> &mut [bool] {
        &mut self.bits
    }
}

impl From<Vec<bool>> for Genome {
    fn from(bits: Vec<bool>) -> Self {
        Self::from_bits(bits)
    }
}

impl<const N: usize> From<[u8; N]> for Genome {
    /// Builds a genome from `0`/`1` digits; any non-zero value counts as a set bit.
    fn from(digits: [u8; N]) -> Self {
        Self::from_bits(digits.iter().map(|d| *d != 0).collect())
    }
}

impl fmt::Display for Genome {
    /// Formats the genome as a string of `0`/`1` characters.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in &self.bits {
            f.write_str(if *bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

/// An ordered collection of genomes of equal length.
///
/// Deserializing checks the lengths the same way [`Population::push`] does.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "Vec<Genome>", try_from = "Vec<Genome>")]
pub struct Population {
    genomes: Vec<Genome>,
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("genome {index} has length {found}, expected {expected}")]
pub struct MismatchedGenomeLength {
    pub index: usize,
    pub expected: usize,
    pub found: usize,
}

impl Population {
    /// Creates a population of `size` random genomes, each `genome_len` bits long.
    pub fn random<R>(rng: &mut R, size: usize, genome_len: usize) -> Self
    where
        R: Rng + ?Sized,
    {
        Self {
            genomes: (0..size).map(|_| Genome::random(rng, genome_len)).collect(),
        }
    }

    /// Creates an empty population with room for `capacity` genomes.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            genomes: Vec::with_capacity(capacity),
        }
    }

    /// Appends a genome.
    ///
    /// # Panics
    ///
    /// Panics if `genome` does not have the same length as the genomes already present.
    pub fn push(&mut self, genome: Genome) {
        if let Some(first) = self.genomes.first() {
            assert_eq!(
                first.len(),
                genome.len(),
                "all genomes in a population must have equal length"
            );
        }
        self.genomes.push(genome);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.genomes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.genomes.is_empty()
    }

    #[must_use]
    pub fn genomes(&self) -> &[Genome] {
        &self.genomes
    }

    /// Returns `true` if `genome` is equal (by value) to some member.
    #[must_use]
    pub fn contains(&self, genome: &Genome) -> bool {
        self.genomes.contains(genome)
    }
}

impl FromIterator<Genome> for Population {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = Genome>,
    {
        let mut population = Population::default();
        for genome in iter {
            population.push(genome);
        }
        population
    }
}

impl TryFrom<Vec<Genome>> for Population {
    type Error = MismatchedGenomeLength;

    fn try_from(genomes: Vec<Genome>) -> Result<Self, Self::Error> {
        if let Some(first) = genomes.first() {
            let expected = first.len();
            if let Some((index, genome)) = genomes
                .iter()
                .enumerate()
                .find(|(_, g)| g.len() != expected)
            {
                return Err(MismatchedGenomeLength {
                    index,
                    expected,
                    found: genome.len(),
                });
            }
        }
        Ok(Self { genomes })
    }
}

impl From<Population> for Vec<Genome> {
    fn from(population: Population) -> Self {
        population.genomes
    }
}
