use serde::{Deserialize, Serialize};

use crate::SiteId;

/// A set of sites as a 32-byte / 256-bit bitmap, one bit per possible SiteId,
/// counting bits from least-to-most significant within ascending words.
/// Iteration is therefore always in ascending site order.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SiteSet {
    bits: [u64; 4],
}

impl SiteSet {
    pub fn new() -> Self {
        SiteSet { bits: [0; 4] }
    }
    fn word_and_mask(site: SiteId) -> (usize, u64) {
        let i = site.0 as usize;
        (i / 64, 1 << (i % 64))
    }
    /// Returns true if the site was not already present.
    pub fn insert(&mut self, site: SiteId) -> bool {
        let (w, m) = Self::word_and_mask(site);
        let fresh = self.bits[w] & m == 0;
        self.bits[w] |= m;
        fresh
    }
    /// Returns true if the site was present.
    pub fn remove(&mut self, site: SiteId) -> bool {
        let (w, m) = Self::word_and_mask(site);
        let present = self.bits[w] & m != 0;
        self.bits[w] &= !m;
        present
    }
    pub fn contains(&self, site: SiteId) -> bool {
        let (w, m) = Self::word_and_mask(site);
        self.bits[w] & m != 0
    }
    pub fn clear(&mut self) {
        self.bits = [0; 4];
    }
    pub fn len(&self) -> usize {
        self.bits.iter().map(|x| x.count_ones() as usize).sum()
    }
    pub fn is_empty(&self) -> bool {
        self.bits.iter().all(|x| *x == 0)
    }
    pub fn union(&mut self, other: &Self) {
        for i in 0..4 {
            self.bits[i] |= other.bits[i];
        }
    }
    pub fn intersect(&mut self, other: &Self) {
        for i in 0..4 {
            self.bits[i] &= other.bits[i];
        }
    }
    pub fn subtract(&mut self, other: &Self) {
        for i in 0..4 {
            self.bits[i] &= !other.bits[i];
        }
    }
    pub fn iter(&self) -> SiteSetIter {
        SiteSetIter {
            bits: self.bits,
            word: 0,
        }
    }
}

pub struct SiteSetIter {
    bits: [u64; 4],
    word: usize,
}

impl Iterator for SiteSetIter {
    type Item = SiteId;
    fn next(&mut self) -> Option<SiteId> {
        while self.word < 4 {
            let w = self.bits[self.word];
            if w == 0 {
                self.word += 1;
                continue;
            }
            let bit = w.trailing_zeros() as usize;
            // Clear the lowest set bit.
            self.bits[self.word] = w & (w - 1);
            return Some(SiteId((self.word * 64 + bit) as u8));
        }
        None
    }
}

impl<'a> IntoIterator for &'a SiteSet {
    type Item = SiteId;
    type IntoIter = SiteSetIter;
    fn into_iter(self) -> SiteSetIter {
        self.iter()
    }
}

impl FromIterator<SiteId> for SiteSet {
    fn from_iter<I: IntoIterator<Item = SiteId>>(iter: I) -> Self {
        let mut set = SiteSet::new();
        for site in iter {
            set.insert(site);
        }
        set
    }
}
