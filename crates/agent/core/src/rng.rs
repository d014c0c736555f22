//! Per-agent deterministic random stream.
//!
//! Every peer holds its own [`RandomStream`] for each agent. The stream is
//! never synchronised draw-by-draw; instead each replicated transition carries
//! a single seed and every peer replaces its stream with
//! [`RandomStream::from_seed`]. Given the same seed, all peers then observe the
//! same sequence of draws inside the new state.
//!
//! # Determinism
//!
//! The generator is PCG-XSH-RR (64-bit state, 32-bit output). It uses only
//! wrapping integer arithmetic, so the sequence is identical on every platform.

use crate::ids::AgentId;

/// Reseedable PCG random stream owned by a single agent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RandomStream {
    state: u64,
    seed: i32,
}

impl RandomStream {
    /// PCG multiplier constant.
    const MULTIPLIER: u64 = 6364136223846793005;

    /// PCG increment constant.
    const INCREMENT: u64 = 1442695040888963407;

    /// Creates a stream whose sequence is fully determined by `seed`.
    pub fn from_seed(seed: i32) -> Self {
        let mut state = Self::pcg_step(0);
        state = state.wrapping_add(Self::avalanche(seed as u32 as u64));
        state = Self::pcg_step(state);
        Self { state, seed }
    }

    /// Seed this stream was created from.
    pub fn seed(&self) -> i32 {
        self.seed
    }

    /// Draws the next raw 32-bit value.
    pub fn next_u32(&mut self) -> u32 {
        let old = self.state;
        self.state = Self::pcg_step(old);
        Self::pcg_output(old)
    }

    /// Draws a non-negative seed suitable for a replication message.
    ///
    /// The result lies in `0..=i32::MAX`.
    pub fn next_seed(&mut self) -> i32 {
        (self.next_u32() >> 1) as i32
    }

    /// Draws a value in `[min, max]` inclusive. Returns `min` when the range is empty.
    pub fn range(&mut self, min: u32, max: u32) -> u32 {
        if min >= max {
            return min;
        }
        let span = max - min + 1;
        min + (self.next_u32() % span)
    }

    /// Draws a float in `[0, 1)` using the upper 24 bits of a draw.
    pub fn next_f32(&mut self) -> f32 {
        (self.next_u32() >> 8) as f32 / (1u32 << 24) as f32
    }

    /// Draws a float in `[min, max)`.
    pub fn range_f32(&mut self, min: f32, max: f32) -> f32 {
        if min >= max {
            return min;
        }
        min + (max - min) * self.next_f32()
    }

    /// Returns `true` with probability `probability` (clamped to `[0, 1]`).
    pub fn chance(&mut self, probability: f32) -> bool {
        self.next_f32() < probability.clamp(0.0, 1.0)
    }

    /// Picks one element uniformly, or `None` for an empty slice.
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let index = self.range(0, items.len() as u32 - 1) as usize;
        items.get(index)
    }

    /// Advance the PCG state by one step.
    ///
    /// `state' = (state × multiplier + increment) mod 2^64`
    #[inline]
    fn pcg_step(state: u64) -> u64 {
        state
            .wrapping_mul(Self::MULTIPLIER)
            .wrapping_add(Self::INCREMENT)
    }

    /// PCG output function using XSH-RR (xorshift high, random rotate).
    #[inline]
    fn pcg_output(state: u64) -> u32 {
        let xorshifted = (((state >> 18) ^ state) >> 27) as u32;
        let rot = (state >> 59) as u32;
        xorshifted.rotate_right(rot)
    }

    /// SplitMix64-style finaliser so that neighbouring seeds start far apart.
    #[inline]
    fn avalanche(mut hash: u64) -> u64 {
        hash ^= hash >> 33;
        hash = hash.wrapping_mul(0xff51afd7ed558ccd);
        hash ^= hash >> 33;
        hash = hash.wrapping_mul(0xc4ceb9fe1a85ec53);
        hash ^= hash >> 33;
        hash
    }
}

/// Seed for an agent's first stream, before any transition has been replicated.
///
/// Every peer derives it from the shared session seed and the agent's stable
/// index, so the initial state draws agree without a message.
pub fn spawn_seed(map_seed: i32, agent: AgentId) -> i32 {
    map_seed.wrapping_add(agent.0 as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_yields_same_sequence() {
        let mut a = RandomStream::from_seed(1234);
        let mut b = RandomStream::from_seed(1234);

        let left: Vec<u32> = (0..32).map(|_| a.next_u32()).collect();
        let right: Vec<u32> = (0..32).map(|_| b.next_u32()).collect();

        assert_eq!(left, right);
    }

    #[test]
    fn neighbouring_seeds_diverge() {
        let mut a = RandomStream::from_seed(7);
        let mut b = RandomStream::from_seed(8);

        let left: Vec<u32> = (0..8).map(|_| a.next_u32()).collect();
        let right: Vec<u32> = (0..8).map(|_| b.next_u32()).collect();

        assert_ne!(left, right);
    }

    #[test]
    fn next_seed_is_never_negative() {
        let mut stream = RandomStream::from_seed(-99);
        for _ in 0..1_000 {
            assert!(stream.next_seed() >= 0);
        }
    }

    #[test]
    fn range_respects_bounds() {
        let mut stream = RandomStream::from_seed(42);
        for _ in 0..1_000 {
            let value = stream.range(3, 9);
            assert!((3..=9).contains(&value));
        }
        assert_eq!(stream.range(5, 5), 5);
        assert_eq!(stream.range(9, 2), 9);
    }

    #[test]
    fn floats_stay_in_unit_interval() {
        let mut stream = RandomStream::from_seed(0);
        for _ in 0..1_000 {
            let value = stream.next_f32();
            assert!((0.0..1.0).contains(&value));
        }
    }

    #[test]
    fn reseeding_replaces_the_sequence() {
        let mut stream = RandomStream::from_seed(10);
        stream.next_u32();
        stream.next_u32();

        let reseeded = RandomStream::from_seed(10);
        assert_ne!(stream, reseeded);
        assert_eq!(reseeded.seed(), 10);
    }

    #[test]
    fn spawn_seed_offsets_by_agent_index() {
        assert_eq!(spawn_seed(100, AgentId(3)), 103);
        assert_eq!(spawn_seed(i32::MAX, AgentId(1)), i32::MIN);
    }
}
